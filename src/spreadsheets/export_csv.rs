use super::{ensure_parent, HEADERS};
use crate::domain::ListingRecord;
use crate::errors::PipelineError;
use crate::templates::format::baths;
use std::path::Path;

/// Same columns as the workbook export, as plain CSV.
pub fn export_listings_csv(listings: &[ListingRecord], path: &Path) -> Result<(), PipelineError> {
    let csv_err = |e: csv::Error| PipelineError::Export(format!("Failed to write CSV: {e}"));

    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;

    writer.write_record(HEADERS).map_err(csv_err)?;
    for l in listings {
        writer
            .write_record([
                l.id.clone(),
                l.address.clone(),
                l.zip_code.clone(),
                l.price.to_string(),
                l.bedrooms.to_string(),
                baths(l.bathrooms),
                l.sqft.to_string(),
                l.year_built.to_string(),
                l.property_type.as_str().to_string(),
                l.source.clone(),
                l.url.clone(),
            ])
            .map_err(csv_err)?;
    }

    writer
        .flush()
        .map_err(|e| PipelineError::Export(format!("Failed to flush CSV: {e}")))?;
    Ok(())
}
