#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Bounding box, severity and grid cell types for the safety overlay.
//!
//! These are the derived, never-persisted shapes handed to the rendering
//! layer. They are recomputed from scratch on every report or viewport
//! change and carry no identity across recomputations.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Ratio above which a cell is [`Severity::Red`].
pub const RED_THRESHOLD: f64 = 0.7;
/// Ratio above which a cell is [`Severity::Orange`].
pub const ORANGE_THRESHOLD: f64 = 0.4;

/// A geographic bounding box in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Southern latitude boundary.
    pub south: f64,
    /// Western longitude boundary.
    pub west: f64,
    /// Northern latitude boundary.
    pub north: f64,
    /// Eastern longitude boundary.
    pub east: f64,
}

impl BoundingBox {
    /// Creates a new bounding box from the given coordinates.
    #[must_use]
    pub const fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            south,
            west,
            north,
            east,
        }
    }

    /// Creates a bounding box from `[lat, lng]` south-west and north-east
    /// corners, the order map libraries report visible bounds in.
    #[must_use]
    pub const fn from_corners(south_west: [f64; 2], north_east: [f64; 2]) -> Self {
        Self {
            south: south_west[0],
            west: south_west[1],
            north: north_east[0],
            east: north_east[1],
        }
    }

    /// Parses a bounding box string `"west,south,east,north"`.
    ///
    /// Returns `None` unless there are exactly four parts and every part
    /// is a number.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let parts = s
            .split(',')
            .map(|p| p.trim().parse::<f64>().ok())
            .collect::<Option<Vec<_>>>()?;

        match parts.as_slice() {
            &[west, south, east, north] => Some(Self::new(west, south, east, north)),
            _ => None,
        }
    }

    /// `[lat, lng]` of the south-west corner.
    #[must_use]
    pub const fn south_west(&self) -> [f64; 2] {
        [self.south, self.west]
    }

    /// `[lat, lng]` of the north-east corner.
    #[must_use]
    pub const fn north_east(&self) -> [f64; 2] {
        [self.north, self.east]
    }

    /// Closed-interval containment on both axes.
    #[must_use]
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        latitude >= self.south
            && latitude <= self.north
            && longitude >= self.west
            && longitude <= self.east
    }

    /// Checks that all edges are finite and not inverted.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::InvalidRegion`] otherwise.
    pub fn validate(&self) -> Result<(), GridError> {
        let finite = [self.south, self.west, self.north, self.east]
            .iter()
            .all(|v| v.is_finite());
        if finite && self.south <= self.north && self.west <= self.east {
            Ok(())
        } else {
            Err(GridError::InvalidRegion { region: *self })
        }
    }
}

/// Categorical risk level of a grid cell.
///
/// Variants are declared in ascending order so the derived [`Ord`] is the
/// visual severity order `green < yellow < orange < red`.
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
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    /// No dangerous reports (or no reports at all).
    Green,
    /// Some dangerous reports, ratio at most 0.4.
    Yellow,
    /// Dangerous ratio above 0.4, at most 0.7.
    Orange,
    /// Dangerous ratio above 0.7.
    Red,
}

impl Severity {
    /// Classifies a dangerous-to-total ratio.
    ///
    /// Pure and monotonic: a higher ratio never yields a lower severity.
    /// A NaN ratio classifies as [`Severity::Green`].
    #[must_use]
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio > RED_THRESHOLD {
            Self::Red
        } else if ratio > ORANGE_THRESHOLD {
            Self::Orange
        } else if ratio > 0.0 {
            Self::Yellow
        } else {
            Self::Green
        }
    }

    /// CSS colour name used as the cell's fill colour.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Orange => "orange",
            Self::Red => "red",
        }
    }

    /// Returns all variants in ascending severity.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Green, Self::Yellow, Self::Orange, Self::Red]
    }
}

/// One classified cell of the overlay grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridCell {
    /// Cell extent.
    pub bounds: BoundingBox,
    /// Number of dangerous reports inside the cell.
    pub dangerous: u32,
    /// Number of reports inside the cell.
    pub total: u32,
    /// Derived severity.
    pub severity: Severity,
}

impl GridCell {
    /// Builds a cell from its counts, deriving the severity.
    ///
    /// `dangerous` is clamped to `total`.
    #[must_use]
    pub fn from_counts(bounds: BoundingBox, dangerous: u32, total: u32) -> Self {
        let dangerous = dangerous.min(total);
        let severity = if total == 0 {
            Severity::Green
        } else {
            Severity::from_ratio(f64::from(dangerous) / f64::from(total))
        };
        Self {
            bounds,
            dangerous,
            total,
            severity,
        }
    }

    /// Dangerous-to-total ratio, or `None` for an empty cell.
    #[must_use]
    pub fn ratio(&self) -> Option<f64> {
        (self.total > 0).then(|| f64::from(self.dangerous) / f64::from(self.total))
    }

    /// Whether no reports fell inside the cell.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.total == 0
    }
}

/// A weighted point for a kernel-density heat layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeatPoint {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Contribution to the density surface.
    pub intensity: f64,
}

impl HeatPoint {
    /// The `[lat, lng, intensity]` triple heat-layer libraries consume.
    #[must_use]
    pub const fn as_triple(&self) -> [f64; 3] {
        [self.latitude, self.longitude, self.intensity]
    }
}

/// One colour stop of the heat gradient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    /// Normalized density at which this colour applies (0.0-1.0).
    pub stop: f64,
    /// CSS colour name or hex value.
    pub color: String,
}

/// Renderer options passed through alongside the heat points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatLayerOptions {
    /// Kernel radius in pixels.
    pub radius: u32,
    /// Blur in pixels.
    pub blur: u32,
    /// Colour stops, ascending.
    #[serde(default = "default_gradient")]
    pub gradient: Vec<GradientStop>,
}

impl Default for HeatLayerOptions {
    fn default() -> Self {
        Self {
            radius: 15,
            blur: 10,
            gradient: default_gradient(),
        }
    }
}

fn default_gradient() -> Vec<GradientStop> {
    [(0.4, "green"), (0.6, "yellow"), (0.8, "orange"), (1.0, "red")]
        .into_iter()
        .map(|(stop, color)| GradientStop {
            stop,
            color: color.to_string(),
        })
        .collect()
}

/// Errors raised before any grid is computed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GridError {
    /// Cell edge length is zero, negative, or not finite.
    #[error("invalid cell size {cell_size}: must be finite and greater than zero")]
    InvalidCellSize {
        /// The rejected cell size.
        cell_size: f64,
    },

    /// Region has non-finite or inverted edges.
    #[error("invalid region {region:?}: edges must be finite with south <= north and west <= east")]
    InvalidRegion {
        /// The rejected region.
        region: BoundingBox,
    },

    /// Zoom level is beyond the deepest supported level.
    #[error("invalid zoom {zoom}: must be at most {max}")]
    InvalidZoom {
        /// The rejected zoom level.
        zoom: u8,
        /// Deepest supported zoom level.
        max: u8,
    },

    /// A coordinate divided by the cell size does not fit a bucket index.
    #[error("coordinate ({latitude}, {longitude}) cannot be bucketed at cell size {cell_size}")]
    BucketOutOfRange {
        /// Latitude of the offending report.
        latitude: f64,
        /// Longitude of the offending report.
        longitude: f64,
        /// Cell size in use.
        cell_size: f64,
    },

    /// The lattice over the region would exceed the configured cap.
    #[error("grid of {requested} cells exceeds the limit of {limit}")]
    TooManyCells {
        /// Cells the lattice would contain.
        requested: u64,
        /// Configured maximum.
        limit: u64,
    },
}

/// Validates a cell edge length.
///
/// # Errors
///
/// Returns [`GridError::InvalidCellSize`] unless `cell_size` is finite and
/// strictly positive.
pub fn validate_cell_size(cell_size: f64) -> Result<(), GridError> {
    if cell_size.is_finite() && cell_size > 0.0 {
        Ok(())
    } else {
        Err(GridError::InvalidCellSize { cell_size })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_thresholds() {
        assert_eq!(Severity::from_ratio(0.0), Severity::Green);
        assert_eq!(Severity::from_ratio(0.01), Severity::Yellow);
        assert_eq!(Severity::from_ratio(0.4), Severity::Yellow);
        assert_eq!(Severity::from_ratio(0.41), Severity::Orange);
        assert_eq!(Severity::from_ratio(0.7), Severity::Orange);
        assert_eq!(Severity::from_ratio(0.75), Severity::Red);
        assert_eq!(Severity::from_ratio(1.0), Severity::Red);
        assert_eq!(Severity::from_ratio(f64::NAN), Severity::Green);
    }

    #[test]
    fn severity_is_monotonic_in_ratio() {
        let mut previous = Severity::Green;
        for step in 0..=1000 {
            let severity = Severity::from_ratio(f64::from(step) / 1000.0);
            assert!(
                severity >= previous,
                "severity dropped from {previous} to {severity} at step {step}"
            );
            previous = severity;
        }
    }

    #[test]
    fn severity_order_matches_visual_order() {
        let all = Severity::all();
        for window in all.windows(2) {
            assert!(window[0] < window[1]);
        }
    }

    #[test]
    fn cell_counts_are_clamped() {
        let bounds = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        let cell = GridCell::from_counts(bounds, 5, 3);
        assert_eq!(cell.dangerous, 3);
        assert_eq!(cell.severity, Severity::Red);

        let empty = GridCell::from_counts(bounds, 0, 0);
        assert!(empty.is_empty());
        assert_eq!(empty.ratio(), None);
        assert_eq!(empty.severity, Severity::Green);
    }

    #[test]
    fn bbox_parse_and_corners() {
        let bbox = BoundingBox::parse("77.1, 28.5,77.3,28.7").unwrap();
        assert_eq!(bbox.south_west(), [28.5, 77.1]);
        assert_eq!(bbox.north_east(), [28.7, 77.3]);
        assert!(BoundingBox::parse("1,2,3").is_none());
        assert!(BoundingBox::parse("a,b,c,d").is_none());
        assert!(BoundingBox::parse("1,2,oops,3,4").is_none());
        assert!(BoundingBox::parse("1,2,3,4,").is_none());
        assert!(BoundingBox::parse("1,2,3,4,5").is_none());

        assert_eq!(
            BoundingBox::from_corners([28.5, 77.1], [28.7, 77.3]),
            bbox
        );
    }

    #[test]
    fn bbox_contains_is_closed() {
        let bbox = BoundingBox::from_corners([0.0, 0.0], [1.0, 1.0]);
        assert!(bbox.contains(0.0, 0.0));
        assert!(bbox.contains(1.0, 1.0));
        assert!(!bbox.contains(1.000_001, 0.5));
    }

    #[test]
    fn bbox_validation() {
        assert!(BoundingBox::from_corners([0.0, 0.0], [0.0, 0.0]).validate().is_ok());
        assert!(BoundingBox::from_corners([1.0, 0.0], [0.0, 1.0]).validate().is_err());
        assert!(
            BoundingBox::from_corners([0.0, f64::INFINITY], [1.0, 1.0])
                .validate()
                .is_err()
        );
    }

    #[test]
    fn cell_size_validation() {
        assert!(validate_cell_size(0.005).is_ok());
        assert!(validate_cell_size(0.0).is_err());
        assert!(validate_cell_size(-1.0).is_err());
        assert!(validate_cell_size(f64::NAN).is_err());
    }

    #[test]
    fn heat_point_triple() {
        let point = HeatPoint {
            latitude: 1.0,
            longitude: 2.0,
            intensity: 0.5,
        };
        assert_eq!(point.as_triple(), [1.0, 2.0, 0.5]);
        assert_eq!(serde_json::to_value(Severity::Orange).unwrap(), "orange");
    }
}
