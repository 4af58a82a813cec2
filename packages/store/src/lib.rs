#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Access to the external `location_safety` collection.
//!
//! The store is a hosted backend reached over HTTP. This crate owns
//! neither its schema nor its transactions: it reads the whole
//! collection, inserts one report, or deletes one report by id. Callers
//! re-fetch the full list after every write.

pub mod memory;
pub mod rest;

use async_trait::async_trait;
use safety_map_safety_models::{NewPointReport, PointReport};

pub use memory::MemoryStore;
pub use rest::{RestStore, StoreConfig};

/// Errors that can occur while talking to the store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The store answered with a non-success status.
    #[error("Store returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// An insert returned no row.
    #[error("Store returned no row for the inserted report")]
    EmptyInsert,

    /// Required configuration is missing.
    #[error("Configuration error: {message}")]
    Config {
        /// What is missing or malformed.
        message: String,
    },
}

/// Read/insert/delete access to the report collection.
#[async_trait]
pub trait SafetyStore: Send + Sync {
    /// Fetches every report.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be reached or answers
    /// with something other than a list of reports.
    async fn list(&self) -> Result<Vec<PointReport>, StoreError>;

    /// Inserts a report and returns the stored row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the insert fails.
    async fn insert(&self, report: NewPointReport) -> Result<PointReport, StoreError>;

    /// Deletes the report with `id`. Deleting a missing id is not an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the delete request fails.
    async fn delete(&self, id: i64) -> Result<(), StoreError>;
}

/// Fetches every report, treating any failure as an empty collection.
///
/// An unreachable store means the overlay draws nothing; it never fails
/// the caller.
pub async fn fetch_or_empty(store: &dyn SafetyStore) -> Vec<PointReport> {
    match store.list().await {
        Ok(reports) => {
            log::debug!("Fetched {} reports", reports.len());
            reports
        }
        Err(e) => {
            log::warn!("Failed to fetch reports, using an empty set: {e}");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct UnreachableStore;

    #[async_trait]
    impl SafetyStore for UnreachableStore {
        async fn list(&self) -> Result<Vec<PointReport>, StoreError> {
            Err(StoreError::Status {
                status: 503,
                body: "unavailable".to_string(),
            })
        }

        async fn insert(&self, _report: NewPointReport) -> Result<PointReport, StoreError> {
            Err(StoreError::EmptyInsert)
        }

        async fn delete(&self, _id: i64) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn failed_fetch_is_empty() {
        assert!(fetch_or_empty(&UnreachableStore).await.is_empty());
    }

    #[tokio::test]
    async fn successful_fetch_passes_through() {
        let store = MemoryStore::new();
        store
            .insert(NewPointReport::new(
                1.0,
                2.0,
                safety_map_safety_models::SafetyKind::Safe,
            ))
            .await
            .unwrap();
        assert_eq!(fetch_or_empty(&store).await.len(), 1);
    }
}
