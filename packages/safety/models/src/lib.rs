#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Point report types and safety classification.
//!
//! A [`PointReport`] is a single geotagged "dangerous" or "safe" marking
//! stored in the external `location_safety` collection. Reports are value
//! objects: they are inserted, deleted and re-fetched wholesale, never
//! mutated in place. Field names on the wire match the store's columns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Safety classification attached to a report.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SafetyKind {
    /// The reporter considers the location unsafe.
    Dangerous,
    /// The reporter considers the location safe.
    Safe,
}

impl SafetyKind {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Dangerous, Self::Safe]
    }

    /// Whether this kind counts towards a cell's dangerous ratio.
    #[must_use]
    pub const fn is_dangerous(self) -> bool {
        matches!(self, Self::Dangerous)
    }
}

/// A report row as returned by the external store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointReport {
    /// Primary key assigned by the store.
    pub id: i64,
    /// Latitude in degrees (WGS84).
    pub latitude: f64,
    /// Longitude in degrees (WGS84).
    pub longitude: f64,
    /// Safety classification.
    #[serde(rename = "type")]
    pub kind: SafetyKind,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a new report.
///
/// The store assigns `id` and `created_at`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NewPointReport {
    /// Latitude in degrees (WGS84).
    pub latitude: f64,
    /// Longitude in degrees (WGS84).
    pub longitude: f64,
    /// Safety classification.
    #[serde(rename = "type")]
    pub kind: SafetyKind,
}

impl NewPointReport {
    /// Creates a new insert payload.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64, kind: SafetyKind) -> Self {
        Self {
            latitude,
            longitude,
            kind,
        }
    }

    /// Checks that the coordinates are finite and in range.
    ///
    /// The grid builder does not validate coordinates, so every write
    /// path must call this before handing a report to the store.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidReportError`] naming the first offending field.
    pub fn validate(&self) -> Result<(), InvalidReportError> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(InvalidReportError::Latitude {
                value: self.latitude,
            });
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(InvalidReportError::Longitude {
                value: self.longitude,
            });
        }
        Ok(())
    }
}

/// Error returned when a [`NewPointReport`] has unusable coordinates.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum InvalidReportError {
    /// Latitude is NaN, infinite, or outside -90..=90.
    #[error("invalid latitude {value}: expected a finite value in -90..=90")]
    Latitude {
        /// The rejected latitude.
        value: f64,
    },
    /// Longitude is NaN, infinite, or outside -180..=180.
    #[error("invalid longitude {value}: expected a finite value in -180..=180")]
    Longitude {
        /// The rejected longitude.
        value: f64,
    },
}
