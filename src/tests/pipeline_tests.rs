// src/tests/pipeline_tests.rs
use crate::config::SearchProfile;
use crate::db::{MemorySeenStore, RunLock, SeenStore, SqliteSeenStore};
use crate::domain::listing::RawValue;
use crate::domain::SeenListingsLog;
use crate::errors::PipelineError;
use crate::mailer::{Notifier, OutboxMailer};
use crate::pipeline::{run_pipeline, RunOptions, RunSummary};
use crate::report::Report;
use crate::source::{JsonFileSource, ListingSource, StaticSource};
use crate::spreadsheets::ExportFormat;
use crate::tests::utils::{raw_house, scenario_criteria, temp_path, ts};
use chrono::Duration;
use std::cell::RefCell;

/// Keeps every delivered report; fails on demand.
#[derive(Default)]
struct RecordingNotifier {
    sent: RefCell<Vec<Report>>,
    fail: bool,
}

impl RecordingNotifier {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn last(&self) -> Report {
        self.sent.borrow().last().cloned().unwrap()
    }
}

impl Notifier for RecordingNotifier {
    fn deliver(&self, report: &Report) -> Result<(), PipelineError> {
        if self.fail {
            return Err(PipelineError::Delivery("smtp relay down".into()));
        }
        self.sent.borrow_mut().push(report.clone());
        Ok(())
    }
}

/// Source that panics if the pipeline reaches the fetch step.
struct UnreachableSource;

impl ListingSource for UnreachableSource {
    fn fetch(&mut self) -> Result<crate::source::Batch, PipelineError> {
        panic!("fetch must not run when the profile is invalid");
    }
}

fn profile() -> SearchProfile {
    SearchProfile {
        criteria: scenario_criteria(),
        recipients: vec!["buyer@example.com".into()],
    }
}

/// Five houses; #3 is a condo at 250k and must be filtered out.
fn condo_batch() -> StaticSource {
    let mut batch: Vec<_> = (1..=5).map(|i| raw_house(&i.to_string())).collect();
    batch[2].property_type = Some("Condo".into());
    batch[2].price = Some(RawValue::Int(250_000));
    StaticSource(batch)
}

fn run(
    source: &mut impl ListingSource,
    store: &mut impl SeenStore,
    notifier: &impl Notifier,
    dry_run: bool,
) -> Result<RunSummary, PipelineError> {
    let options = RunOptions {
        dry_run,
        ..RunOptions::default()
    };
    run_pipeline(&profile(), source, store, notifier, &options, ts(24))
}

#[test]
fn reports_matches_not_seen_before() {
    let mut store = MemorySeenStore::with_log(SeenListingsLog::from_entries([(
        "zillow:2".to_string(),
        ts(0),
    )]));
    let notifier = RecordingNotifier::default();

    let summary = run(&mut condo_batch(), &mut store, &notifier, false).unwrap();

    assert_eq!(summary.fetched, 5);
    assert_eq!(summary.matched, 4);
    assert_eq!(summary.rejected, 1);
    assert_eq!(summary.already_seen, 1);
    assert_eq!(summary.novel, 3);
    assert!(summary.delivered);
    assert_eq!(summary.persisted, 3);

    let report = notifier.last();
    assert_eq!(report.subject, "Daily House Listings - 3 new listings found");
    for street in ["1 Main St", "4 Main St", "5 Main St"] {
        assert!(report.html.contains(street), "missing {street}");
    }
    assert!(!report.html.contains("2 Main St"));
    assert!(!report.html.contains("3 Main St"));

    let log = store.load().unwrap();
    assert_eq!(log.len(), 4);
    assert_eq!(log.first_seen("zillow:2"), Some(ts(0)));
    assert_eq!(log.first_seen("zillow:5"), Some(ts(24)));
}

#[test]
fn second_run_over_same_batch_reports_nothing_new() {
    let mut store = MemorySeenStore::default();
    let notifier = RecordingNotifier::default();

    run(&mut condo_batch(), &mut store, &notifier, false).unwrap();
    let second = run(&mut condo_batch(), &mut store, &notifier, false).unwrap();

    assert_eq!(second.novel, 0);
    assert_eq!(second.already_seen, 4);
    assert_eq!(second.persisted, 0);

    let report = notifier.last();
    assert!(report.is_empty());
    assert_eq!(report.subject, "Daily House Listings - no new matches");
}

#[test]
fn failed_delivery_leaves_log_untouched() {
    let mut store = MemorySeenStore::default();

    let summary = run(&mut condo_batch(), &mut store, &RecordingNotifier::failing(), false).unwrap();

    assert!(!summary.delivered);
    assert_eq!(summary.novel, 4);
    assert_eq!(store.persist_calls, 0);

    // The next successful run reports the same listings again.
    let retry = run(&mut condo_batch(), &mut store, &RecordingNotifier::default(), false).unwrap();
    assert_eq!(retry.novel, 4);
}

#[test]
fn dry_run_delivers_but_does_not_persist() {
    let mut store = MemorySeenStore::default();
    let notifier = RecordingNotifier::default();

    let summary = run(&mut condo_batch(), &mut store, &notifier, true).unwrap();

    assert!(summary.delivered);
    assert_eq!(summary.novel, 4);
    assert_eq!(store.persist_calls, 0);
    assert!(store.log.is_empty());
}

#[test]
fn invalid_criteria_fails_before_fetching() {
    let mut bad = profile();
    bad.criteria.min_price = 500_000;

    let err = run_pipeline(
        &bad,
        &mut UnreachableSource,
        &mut MemorySeenStore::default(),
        &RecordingNotifier::default(),
        &RunOptions::default(),
        ts(1),
    )
    .unwrap_err();

    assert!(matches!(err, PipelineError::Configuration(_)));
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn corrupt_store_dry_run_leaves_file_alone() {
    let path = temp_path("pipeline_corrupt_dry", "sqlite3");
    let garbage = "not a database ".repeat(512);
    std::fs::write(&path, &garbage).unwrap();

    let mut store = SqliteSeenStore::new(&path);
    let summary = run(&mut condo_batch(), &mut store, &RecordingNotifier::default(), true).unwrap();

    assert_eq!(summary.novel, 4);
    assert!(summary.delivered);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), garbage);
}

#[test]
fn corrupt_store_is_replaced_and_next_run_dedups() {
    let path = temp_path("pipeline_corrupt", "sqlite3");
    std::fs::write(&path, "not a database ".repeat(512)).unwrap();
    let notifier = RecordingNotifier::default();

    let first = run(&mut condo_batch(), &mut SqliteSeenStore::new(&path), &notifier, false).unwrap();
    assert_eq!(first.novel, 4);
    assert_eq!(first.persisted, 4);
    assert!(SqliteSeenStore::new(&path).quarantine_path(ts(24)).exists());

    let second = run(&mut condo_batch(), &mut SqliteSeenStore::new(&path), &notifier, false).unwrap();
    assert_eq!(second.novel, 0);
    assert_eq!(second.already_seen, 4);
    assert_eq!(notifier.sent.borrow().len(), 2);
}

#[test]
fn sub_second_run_time_round_trips_through_sqlite() {
    let path = temp_path("pipeline_subsec", "sqlite3");
    let now = ts(24) + Duration::milliseconds(750);

    let mut store = SqliteSeenStore::new(&path);
    run_pipeline(
        &profile(),
        &mut condo_batch(),
        &mut store,
        &RecordingNotifier::default(),
        &RunOptions::default(),
        now,
    )
    .unwrap();

    let mut memory = MemorySeenStore::default();
    run_pipeline(
        &profile(),
        &mut condo_batch(),
        &mut memory,
        &RecordingNotifier::default(),
        &RunOptions::default(),
        now,
    )
    .unwrap();

    let loaded = SqliteSeenStore::new(&path).load().unwrap();
    assert_eq!(loaded, memory.log);
    assert_eq!(loaded.first_seen("zillow:1"), Some(ts(24)));
}

#[test]
fn overlong_url_still_exports_and_delivers() {
    let mut batch = condo_batch();
    batch.0[0].url = Some(format!(
        "https://www.zillow.com/homedetails/1_zpid/?q={}",
        "x".repeat(2100)
    ));
    let exports = temp_path("pipeline_long_url", "d");
    let notifier = RecordingNotifier::default();
    let options = RunOptions {
        export_dir: Some(exports.clone()),
        ..RunOptions::default()
    };

    let summary = run_pipeline(
        &profile(),
        &mut batch,
        &mut MemorySeenStore::default(),
        &notifier,
        &options,
        ts(2),
    )
    .unwrap();

    assert!(summary.delivered);
    assert!(summary.export.unwrap().exists());
    assert_eq!(notifier.sent.borrow().len(), 1);
}

#[test]
fn failed_export_does_not_block_delivery() {
    // A plain file where the export directory should be.
    let blocker = temp_path("pipeline_export_blocked", "txt");
    std::fs::write(&blocker, "occupied").unwrap();
    let notifier = RecordingNotifier::default();
    let mut store = MemorySeenStore::default();
    let options = RunOptions {
        export_dir: Some(blocker.join("exports")),
        export_format: ExportFormat::Csv,
        ..RunOptions::default()
    };

    let summary = run_pipeline(
        &profile(),
        &mut condo_batch(),
        &mut store,
        &notifier,
        &options,
        ts(2),
    )
    .unwrap();

    assert_eq!(summary.export, None);
    assert!(summary.delivered);
    assert_eq!(summary.persisted, 4);
}

#[test]
fn sqlite_store_survives_between_runs() {
    let path = temp_path("pipeline_sqlite", "sqlite3");
    let notifier = RecordingNotifier::default();

    {
        let _lock = RunLock::acquire(&path).unwrap();
        let mut store = SqliteSeenStore::new(&path);
        let first = run(&mut condo_batch(), &mut store, &notifier, false).unwrap();
        assert_eq!(first.persisted, 4);
    }

    let _lock = RunLock::try_acquire(&path).unwrap().expect("lock was released");
    let mut store = SqliteSeenStore::new(&path);
    let mut batch = condo_batch();
    batch.0.push(raw_house("6"));
    let second = run(&mut batch, &mut store, &notifier, false).unwrap();

    assert_eq!(second.novel, 1);
    assert!(notifier.last().html.contains("6 Main St"));
    assert_eq!(store.load().unwrap().len(), 5);
}

#[test]
fn json_file_to_outbox_with_export() {
    let input = temp_path("pipeline_input", "json");
    std::fs::write(
        &input,
        r#"{"results": [
            {"zpid": 11, "streetAddress": "11 Elm St", "city": "Warwick", "state": "NY",
             "zipcode": "10990-1234", "price": "$310,000", "beds": 3, "baths": 1.5,
             "livingArea": 1650, "yearBuilt": 1988, "homeType": "SINGLE_FAMILY",
             "detailUrl": "/homedetails/11_zpid/"},
            {"zpid": 12, "streetAddress": "12 Elm St", "zipcode": "10990",
             "price": "Contact agent", "beds": 3, "baths": 2, "livingArea": 1700,
             "yearBuilt": 1990, "homeType": "SINGLE_FAMILY"},
            "not a listing"
        ]}"#,
    )
    .unwrap();

    let outbox = temp_path("pipeline_outbox", "d");
    let exports = temp_path("pipeline_exports", "d");
    let notifier = OutboxMailer::new(&outbox);
    let options = RunOptions {
        dry_run: false,
        export_dir: Some(exports.clone()),
        export_format: ExportFormat::Csv,
    };

    let summary = run_pipeline(
        &profile(),
        &mut JsonFileSource::new(&input, Some("Zillow".into())),
        &mut MemorySeenStore::default(),
        &notifier,
        &options,
        ts(5),
    )
    .unwrap();

    assert_eq!(summary.fetched, 3);
    assert_eq!(summary.undecodable, 1);
    assert_eq!(summary.malformed, 1);
    assert_eq!(summary.novel, 1);

    let export = summary.export.clone().unwrap();
    assert!(export.starts_with(&exports));
    assert_eq!(export.extension().and_then(|e| e.to_str()), Some("csv"));
    let exported = std::fs::read_to_string(&export).unwrap();
    assert_eq!(exported.lines().count(), 2);
    assert!(exported.contains("zillow:11"));

    let html = std::fs::read_dir(&outbox)
        .unwrap()
        .filter_map(Result::ok)
        .map(|e| std::fs::read_to_string(e.path()).unwrap())
        .next()
        .unwrap();
    assert!(html.contains("11 Elm St, Warwick, NY 10990"));
    assert!(html.contains("https://www.zillow.com/homedetails/11_zpid/"));
    assert!(summary.to_string().contains("novel 1"));
}
