// src/domain/filter.rs

use crate::domain::criteria::{Predicate, SearchCriteria};
use crate::domain::listing::{ListingRecord, RawListing};

/// Result of filtering one batch.
#[derive(Debug, Default)]
pub struct FilterOutcome {
    /// Records passing every evaluated predicate, in input order.
    pub matched: Vec<ListingRecord>,
    /// Records dropped because a required field was missing or unparseable.
    pub malformed: usize,
    /// Well-formed records failing at least one predicate.
    pub rejected: usize,
}

/// Normalizes the batch and keeps the records that satisfy every predicate.
pub fn filter_listings(raw: &[RawListing], criteria: &SearchCriteria) -> FilterOutcome {
    filter_with(raw, criteria, &Predicate::ALL)
}

/// Same as `filter_listings`, but only the given predicates are evaluated.
pub fn filter_with(
    raw: &[RawListing],
    criteria: &SearchCriteria,
    predicates: &[Predicate],
) -> FilterOutcome {
    let mut outcome = FilterOutcome::default();

    for (index, item) in raw.iter().enumerate() {
        let rec = match ListingRecord::from_raw(item) {
            Ok(rec) => rec,
            Err(e) => {
                tracing::debug!(index, reason = %e, "dropping malformed listing");
                outcome.malformed += 1;
                continue;
            }
        };

        if predicates.iter().all(|p| criteria.admits(*p, &rec)) {
            outcome.matched.push(rec);
        } else {
            tracing::debug!(id = %rec.id, "listing does not match criteria");
            outcome.rejected += 1;
        }
    }

    outcome
}
