pub mod components;
pub mod format;
pub mod layouts;
pub mod pages;

// Re-exports for convenience
pub use components::{criteria_summary, listing_card};
pub use layouts::email::email_layout;
pub use pages::report_page;
