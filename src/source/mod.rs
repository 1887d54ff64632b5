mod json_file;

pub use json_file::JsonFileSource;

use crate::domain::RawListing;
use crate::errors::PipelineError;

/// One fetcher delivery.
#[derive(Debug, Default)]
pub struct Batch {
    pub listings: Vec<RawListing>,
    /// Items that were not even listing-shaped (wrong JSON types).
    pub undecodable: usize,
}

/// Seam to the external fetcher that produces raw listings for a run.
pub trait ListingSource {
    fn fetch(&mut self) -> Result<Batch, PipelineError>;
}

/// Fixed batch for pipeline tests.
#[cfg(test)]
pub struct StaticSource(pub Vec<RawListing>);

#[cfg(test)]
impl ListingSource for StaticSource {
    fn fetch(&mut self) -> Result<Batch, PipelineError> {
        Ok(Batch {
            listings: std::mem::take(&mut self.0),
            undecodable: 0,
        })
    }
}
