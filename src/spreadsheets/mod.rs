pub mod export_csv;
pub mod export_xlsx;

pub use export_csv::export_listings_csv;
pub use export_xlsx::export_listings_xlsx;

use crate::domain::ListingRecord;
use crate::errors::PipelineError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const HEADERS: [&str; 11] = [
    "Identifier",
    "Address",
    "Zip",
    "Price",
    "Beds",
    "Baths",
    "Sq Ft",
    "Year Built",
    "Type",
    "Source",
    "URL",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Xlsx,
    Csv,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "xlsx" => Some(ExportFormat::Xlsx),
            "csv" => Some(ExportFormat::Csv),
            _ => None,
        }
    }
}

pub fn default_export_path(dir: &Path, now: DateTime<Utc>, format: ExportFormat) -> PathBuf {
    dir.join(format!(
        "house_listings_{}.{}",
        now.format("%Y%m%d_%H%M%S"),
        format.extension()
    ))
}

/// Writes `listings` into `dir` in the chosen format and returns the file.
pub fn export_listings(
    listings: &[ListingRecord],
    dir: &Path,
    format: ExportFormat,
    now: DateTime<Utc>,
) -> Result<PathBuf, PipelineError> {
    let path = default_export_path(dir, now, format);
    match format {
        ExportFormat::Xlsx => export_listings_xlsx(listings, &path)?,
        ExportFormat::Csv => export_listings_csv(listings, &path)?,
    }
    tracing::info!(path = %path.display(), rows = listings.len(), "listings exported");
    Ok(path)
}

fn ensure_parent(path: &Path) -> Result<(), PipelineError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            PipelineError::Export(format!("Failed to create {}: {e}", parent.display()))
        })?;
    }
    Ok(())
}
