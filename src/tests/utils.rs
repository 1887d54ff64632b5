use crate::domain::listing::RawValue;
use crate::domain::{ListingRecord, PropertyType, RawListing, SearchCriteria};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// A Plano house that passes `scenario_criteria`. Its id normalizes to
/// `zillow:<id>`.
pub fn raw_house(id: &str) -> RawListing {
    RawListing {
        id: Some(RawValue::Text(id.to_string())),
        source: Some("Zillow".into()),
        address: Some(format!("{id} Main St")),
        city: Some("Plano".into()),
        state: Some("TX".into()),
        zip_code: Some(RawValue::Text("75024".into())),
        price: Some(RawValue::Int(350_000)),
        bedrooms: Some(RawValue::Int(3)),
        bathrooms: Some(RawValue::Int(2)),
        sqft: Some(RawValue::Int(1800)),
        year_built: Some(RawValue::Int(1995)),
        property_type: Some("house".into()),
        url: Some(format!("https://www.zillow.com/homedetails/{id}_zpid/")),
    }
}

pub fn record(id: &str) -> ListingRecord {
    ListingRecord::from_raw(&raw_house(id)).unwrap()
}

pub fn scenario_criteria() -> SearchCriteria {
    SearchCriteria {
        min_price: 200_000,
        max_price: 405_000,
        min_year_built: 1980,
        max_year_built: 2020,
        property_types: BTreeSet::from([PropertyType::House]),
        min_bedrooms: 2,
        min_bathrooms: 1.0,
        min_sqft: 1400,
        max_sqft: None,
        zip_codes: BTreeSet::new(),
    }
}

/// 2024-01-01T00:00:00Z plus `hours`.
pub fn ts(hours: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::hours(hours)
}

/// Fresh path under the system temp dir; nothing is created.
pub fn temp_path(prefix: &str, ext: &str) -> PathBuf {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!(
        "listing_watch_{prefix}_{}_{nanos}_{n}.{ext}",
        std::process::id()
    ))
}
