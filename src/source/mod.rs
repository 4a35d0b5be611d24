//! Record sources.
//!
//! A source yields the full record array. The remote analytics API is the
//! normal source; a local JSON file holding the same array can stand in
//! for it.

pub mod http;

pub use http::{ApiClient, ClientConfig};

use crate::error::FetchError;
use crate::models::Record;
use serde_json::Value;
use std::future::Future;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Something that can produce the complete record array.
pub trait RecordSource {
    /// Human-readable origin (URL or path) for logs and reports.
    fn describe(&self) -> String;

    /// Fetch every record.
    fn fetch_all(&self) -> impl Future<Output = Result<Vec<Record>, FetchError>> + Send;
}

/// Records read from a JSON file on disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch_all(&self) -> Result<Vec<Record>, FetchError> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| FetchError::Io {
                path: self.path.clone(),
                source,
            })?;

        decode_records(&self.describe(), &text)
    }
}

/// Decode a payload that must be a JSON array of records.
///
/// Elements that are not record objects are skipped with a warning rather
/// than failing the whole load.
pub fn decode_records(origin: &str, text: &str) -> Result<Vec<Record>, FetchError> {
    let payload: Value = serde_json::from_str(text).map_err(|source| FetchError::Decode {
        origin: origin.to_string(),
        source,
    })?;

    let items = match payload {
        Value::Array(items) => items,
        other => {
            return Err(FetchError::NotAnArray {
                origin: origin.to_string(),
                found: json_kind(&other),
            })
        }
    };

    let total = items.len();
    let mut records = Vec::with_capacity(total);

    for (index, item) in items.into_iter().enumerate() {
        // serde would also read a JSON array positionally into a Record
        if !item.is_object() {
            debug!(
                "Skipping element {} from {}: a JSON {}, not an object",
                index,
                origin,
                json_kind(&item)
            );
            continue;
        }

        match serde_json::from_value::<Record>(item) {
            Ok(record) => records.push(record),
            Err(e) => debug!("Skipping element {} from {}: {}", index, origin, e),
        }
    }

    if records.len() < total {
        warn!(
            "Skipped {} malformed elements from {}",
            total - records.len(),
            origin
        );
    }

    Ok(records)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
