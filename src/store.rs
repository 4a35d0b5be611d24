//! In-memory record store.
//!
//! The store holds one immutable snapshot. Every load replaces it
//! wholesale; readers share it through an `Arc` and never observe a
//! partially replaced array.

use crate::error::FetchError;
use crate::models::Record;
use crate::source::RecordSource;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info};

/// Holds the most recently loaded record snapshot.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    snapshot: Arc<Vec<Record>>,
    generation: u64,
    origin: Option<String>,
    loaded_at: Option<DateTime<Utc>>,
}

impl RecordStore {
    /// Create an empty, unloaded store.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[Record] {
        &self.snapshot
    }

    /// Shared handle to the current snapshot.
    #[cfg(test)]
    pub fn snapshot(&self) -> Arc<Vec<Record>> {
        Arc::clone(&self.snapshot)
    }

    /// Number of successful replacements so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_loaded(&self) -> bool {
        self.generation > 0
    }

    /// Where the current snapshot came from.
    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }

    /// Replace the whole snapshot.
    pub fn replace(&mut self, records: Vec<Record>, origin: impl Into<String>) {
        let origin = origin.into();
        debug!(
            "Replacing snapshot (generation {}) with {} records from {}",
            self.generation + 1,
            records.len(),
            origin
        );

        self.snapshot = Arc::new(records);
        self.generation += 1;
        self.origin = Some(origin);
        self.loaded_at = Some(Utc::now());
    }

    /// Fetch from `source` and replace the snapshot on success.
    ///
    /// On failure the previous snapshot is left untouched.
    pub async fn load<S: RecordSource>(&mut self, source: &S) -> Result<usize, FetchError> {
        let records = source.fetch_all().await?;
        let count = records.len();
        self.replace(records, source.describe());
        info!("Loaded {} records from {}", count, source.describe());
        Ok(count)
    }
}
