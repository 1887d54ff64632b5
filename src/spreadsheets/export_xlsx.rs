use super::{ensure_parent, HEADERS};
use crate::domain::ListingRecord;
use crate::errors::PipelineError;
use rust_xlsxwriter::Workbook;
use std::path::Path;

// Excel refuses hyperlinks longer than this; such links go in as text.
const MAX_URL_LEN: usize = 2080;

/// Archives one run's novel listings, one row per listing.
pub fn export_listings_xlsx(listings: &[ListingRecord], path: &Path) -> Result<(), PipelineError> {
    let xlsx_err = |what: &str, e: rust_xlsxwriter::XlsxError| {
        PipelineError::Export(format!("Failed to write {what}: {e}"))
    };

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    for (col, header) in HEADERS.iter().enumerate() {
        worksheet
            .write_string(0, col as u16, *header)
            .map_err(|e| xlsx_err("header", e))?;
    }

    for (i, listing) in listings.iter().enumerate() {
        let r = (i + 1) as u32;

        worksheet
            .write_string(r, 0, &listing.id)
            .map_err(|e| xlsx_err("identifier", e))?;
        worksheet
            .write_string(r, 1, &listing.address)
            .map_err(|e| xlsx_err("address", e))?;
        worksheet
            .write_string(r, 2, &listing.zip_code)
            .map_err(|e| xlsx_err("zip", e))?;
        worksheet
            .write_number(r, 3, listing.price as f64)
            .map_err(|e| xlsx_err("price", e))?;
        worksheet
            .write_number(r, 4, listing.bedrooms as f64)
            .map_err(|e| xlsx_err("bedrooms", e))?;
        worksheet
            .write_number(r, 5, listing.bathrooms)
            .map_err(|e| xlsx_err("bathrooms", e))?;
        worksheet
            .write_number(r, 6, listing.sqft as f64)
            .map_err(|e| xlsx_err("sqft", e))?;
        worksheet
            .write_number(r, 7, listing.year_built as f64)
            .map_err(|e| xlsx_err("year built", e))?;
        worksheet
            .write_string(r, 8, listing.property_type.as_str())
            .map_err(|e| xlsx_err("type", e))?;
        worksheet
            .write_string(r, 9, &listing.source)
            .map_err(|e| xlsx_err("source", e))?;

        if listing.url.len() <= MAX_URL_LEN {
            worksheet
                .write_url(r, 10, listing.url.as_str())
                .map_err(|e| xlsx_err("url", e))?;
        } else {
            worksheet
                .write_string(r, 10, &listing.url)
                .map_err(|e| xlsx_err("url", e))?;
        }
    }

    ensure_parent(path)?;
    workbook
        .save(path)
        .map_err(|e| PipelineError::Export(format!("Failed to save workbook: {e}")))?;

    Ok(())
}
