pub mod criteria;
pub mod dedup;
pub mod filter;
pub mod listing;

pub use criteria::SearchCriteria;
pub use dedup::{partition_novel, SeenListingsLog};
pub use filter::filter_listings;
pub use listing::{ListingRecord, PropertyType, RawListing};
