use super::{Batch, ListingSource};
use crate::domain::RawListing;
use crate::errors::PipelineError;
use serde_json::Value;
use std::path::PathBuf;

// Keys providers wrap their result arrays in.
const WRAPPER_KEYS: [&str; 5] = ["results", "listings", "properties", "homes", "data"];

/// Reads a fetcher's JSON dump from disk.
pub struct JsonFileSource {
    path: PathBuf,
    /// Stamped on records that do not name their own source.
    default_source: Option<String>,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>, default_source: Option<String>) -> Self {
        Self {
            path: path.into(),
            default_source,
        }
    }
}

impl ListingSource for JsonFileSource {
    fn fetch(&mut self) -> Result<Batch, PipelineError> {
        let text = std::fs::read_to_string(&self.path).map_err(|e| {
            PipelineError::Input(format!("Failed to read {}: {e}", self.path.display()))
        })?;

        let mut batch = parse_batch(&text)?;

        if let Some(source) = &self.default_source {
            for listing in batch.listings.iter_mut().filter(|l| l.source.is_none()) {
                listing.source = Some(source.clone());
            }
        }

        tracing::info!(
            path = %self.path.display(),
            listings = batch.listings.len(),
            undecodable = batch.undecodable,
            "batch loaded"
        );
        Ok(batch)
    }
}

/// Accepts a bare array or an object wrapping the array under one of the
/// usual keys. Items that do not decode are counted, not fatal.
pub fn parse_batch(text: &str) -> Result<Batch, PipelineError> {
    let data: Value = serde_json::from_str(text)
        .map_err(|e| PipelineError::Input(format!("JSON parse error: {e}")))?;

    let items = match data {
        Value::Array(items) => items,
        Value::Object(mut obj) => WRAPPER_KEYS
            .iter()
            .find_map(|k| match obj.remove(*k) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            })
            .ok_or_else(|| {
                PipelineError::Input(format!(
                    "expected an array or an object with one of: {}",
                    WRAPPER_KEYS.join(", ")
                ))
            })?,
        _ => {
            return Err(PipelineError::Input(
                "expected a JSON array of listings".into(),
            ))
        }
    };

    let mut batch = Batch::default();
    for (index, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<RawListing>(item) {
            Ok(listing) => batch.listings.push(listing),
            Err(e) => {
                tracing::debug!(index, error = %e, "undecodable listing");
                batch.undecodable += 1;
            }
        }
    }

    Ok(batch)
}
