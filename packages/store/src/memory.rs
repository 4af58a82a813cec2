//! In-process store.
//!
//! Mirrors the hosted store's behaviour closely enough for tests and for
//! running the server without a backend: ids are assigned sequentially,
//! `created_at` is stamped on insert, and deleting a missing id is a
//! no-op.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use safety_map_safety_models::{NewPointReport, PointReport};

use crate::{SafetyStore, StoreError};

#[derive(Debug, Default)]
struct MemoryState {
    next_id: i64,
    reports: Vec<PointReport>,
}

/// A [`SafetyStore`] backed by a `Vec` behind a mutex.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `reports`.
    ///
    /// New ids continue after the largest existing id.
    #[must_use]
    pub fn with_reports(reports: Vec<PointReport>) -> Self {
        let next_id = reports.iter().map(|r| r.id).max().unwrap_or(0);
        Self {
            state: Mutex::new(MemoryState { next_id, reports }),
        }
    }
}

#[async_trait]
impl SafetyStore for MemoryStore {
    async fn list(&self) -> Result<Vec<PointReport>, StoreError> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(state.reports.clone())
    }

    async fn insert(&self, report: NewPointReport) -> Result<PointReport, StoreError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.next_id += 1;

        let stored = PointReport {
            id: state.next_id,
            latitude: report.latitude,
            longitude: report.longitude,
            kind: report.kind,
            created_at: Utc::now(),
        };
        state.reports.push(stored.clone());

        Ok(stored)
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.reports.retain(|r| r.id != id);
        Ok(())
    }
}
