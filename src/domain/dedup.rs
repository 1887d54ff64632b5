// src/domain/dedup.rs

use crate::domain::listing::ListingRecord;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Identifiers already reported, each with the time it was first logged.
///
/// Grows monotonically; entries only disappear through an explicit prune.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeenListingsLog {
    entries: BTreeMap<String, DateTime<Utc>>,
}

impl SeenListingsLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, DateTime<Utc>)>,
    {
        let mut log = Self::new();
        for (id, at) in entries {
            log.record(id, at);
        }
        log
    }

    #[cfg(test)]
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    #[cfg(test)]
    pub fn first_seen(&self, id: &str) -> Option<DateTime<Utc>> {
        self.entries.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, DateTime<Utc>)> {
        self.entries.iter().map(|(id, at)| (id.as_str(), *at))
    }

    /// Adds `id` unless already present. An existing entry keeps its
    /// original timestamp.
    pub fn record(&mut self, id: String, at: DateTime<Utc>) -> bool {
        if self.entries.contains_key(&id) {
            return false;
        }
        self.entries.insert(id, at);
        true
    }

    /// Removes entries logged strictly before `cutoff`.
    #[cfg(test)]
    pub fn prune_before(&mut self, cutoff: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, at| *at >= cutoff);
        before - self.entries.len()
    }
}

#[derive(Debug)]
pub struct DedupOutcome {
    /// Records not in the log, in input order.
    pub novel: Vec<ListingRecord>,
    pub already_seen: Vec<ListingRecord>,
    /// The input log plus every novel id stamped with the run time.
    pub updated_log: SeenListingsLog,
}

/// Splits `filtered` into novel and already-seen records.
///
/// `log` is left untouched; the caller owns persisting `updated_log`.
/// An id repeated within the batch is novel at most once.
pub fn partition_novel(
    filtered: Vec<ListingRecord>,
    log: &SeenListingsLog,
    now: DateTime<Utc>,
) -> DedupOutcome {
    let mut updated_log = log.clone();
    let mut novel = Vec::new();
    let mut already_seen = Vec::new();

    for rec in filtered {
        if updated_log.record(rec.id.clone(), now) {
            novel.push(rec);
        } else {
            already_seen.push(rec);
        }
    }

    DedupOutcome {
        novel,
        already_seen,
        updated_log,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::utils::{record, ts};

    fn ids(recs: &[ListingRecord]) -> Vec<&str> {
        recs.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn previously_logged_id_is_not_novel() {
        let log = SeenListingsLog::from_entries([("zillow:2".to_string(), ts(1))]);
        let batch = vec![record("1"), record("2"), record("3")];

        let out = partition_novel(batch, &log, ts(10));

        assert_eq!(ids(&out.novel), vec!["zillow:1", "zillow:3"]);
        assert_eq!(ids(&out.already_seen), vec!["zillow:2"]);
        assert_eq!(out.updated_log.len(), 3);
        assert_eq!(out.updated_log.first_seen("zillow:2"), Some(ts(1)));
        assert_eq!(out.updated_log.first_seen("zillow:3"), Some(ts(10)));
    }

    #[test]
    fn input_log_is_not_mutated() {
        let log = SeenListingsLog::new();
        let _ = partition_novel(vec![record("1")], &log, ts(10));
        assert!(log.is_empty());
    }

    #[test]
    fn second_run_with_updated_log_yields_nothing_novel() {
        let batch = vec![record("1"), record("2")];

        let first = partition_novel(batch.clone(), &SeenListingsLog::new(), ts(10));
        let second = partition_novel(batch, &first.updated_log, ts(20));

        assert_eq!(first.novel.len(), 2);
        assert!(second.novel.is_empty());
        assert_eq!(second.updated_log, first.updated_log);
    }

    #[test]
    fn novel_ids_stay_excluded_in_later_runs() {
        let first = partition_novel(vec![record("7")], &SeenListingsLog::new(), ts(1));
        assert!(first.updated_log.contains("zillow:7"));

        let mut log = first.updated_log;
        for run in 2..6 {
            let batch = vec![record("7"), record(&format!("n{run}"))];
            let out = partition_novel(batch, &log, ts(run));
            assert_eq!(ids(&out.novel), vec![format!("zillow:n{run}").as_str()]);
            log = out.updated_log;
        }
    }

    #[test]
    fn duplicate_ids_in_one_batch_reported_once() {
        let out = partition_novel(
            vec![record("1"), record("1")],
            &SeenListingsLog::new(),
            ts(1),
        );
        assert_eq!(out.novel.len(), 1);
        assert_eq!(out.already_seen.len(), 1);
    }

    #[test]
    fn prune_drops_only_older_entries() {
        let mut log = SeenListingsLog::from_entries([
            ("a".to_string(), ts(1)),
            ("b".to_string(), ts(5)),
            ("c".to_string(), ts(9)),
        ]);
        assert_eq!(log.prune_before(ts(5)), 1);
        assert!(!log.contains("a"));
        assert!(log.contains("b"));
    }
}
