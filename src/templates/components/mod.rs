pub mod criteria_summary;
pub mod listing_card;

pub use criteria_summary::criteria_summary;
pub use listing_card::listing_card;
