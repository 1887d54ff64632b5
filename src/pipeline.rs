// src/pipeline.rs

use crate::config::SearchProfile;
use crate::db::SeenStore;
use crate::domain::{filter_listings, partition_novel, SeenListingsLog};
use crate::errors::{PipelineError, PipelineResult};
use crate::mailer::Notifier;
use crate::report::build_report;
use crate::source::ListingSource;
use crate::spreadsheets::{export_listings, ExportFormat};
use chrono::{DateTime, SubsecRound, Utc};
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Deliver as usual but leave the seen log untouched.
    pub dry_run: bool,
    pub export_dir: Option<PathBuf>,
    pub export_format: ExportFormat,
}

/// Counters for one run, printed as the closing log line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub fetched: usize,
    pub undecodable: usize,
    pub malformed: usize,
    pub rejected: usize,
    pub matched: usize,
    pub already_seen: usize,
    pub novel: usize,
    pub delivered: bool,
    /// Ids newly written to the store.
    pub persisted: usize,
    pub export: Option<PathBuf>,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "fetched {} (undecodable {}, malformed {}, rejected {}), matched {}, \
             already seen {}, novel {}, delivered {}, persisted {}",
            self.fetched,
            self.undecodable,
            self.malformed,
            self.rejected,
            self.matched,
            self.already_seen,
            self.novel,
            if self.delivered { "yes" } else { "no" },
            self.persisted
        )?;
        if let Some(path) = &self.export {
            write!(f, ", exported {}", path.display())?;
        }
        Ok(())
    }
}

/// One linear pass: fetch, filter, dedup, report, export, deliver, persist.
///
/// The seen log is persisted only after a successful delivery, so a failed
/// send reports the same listings again next run. An unreadable log is set
/// aside and replaced at persist time. Export is best effort. The caller
/// holds the run lock.
pub fn run_pipeline<S, T, N>(
    profile: &SearchProfile,
    source: &mut S,
    store: &mut T,
    notifier: &N,
    options: &RunOptions,
    now: DateTime<Utc>,
) -> PipelineResult<RunSummary>
where
    S: ListingSource + ?Sized,
    T: SeenStore + ?Sized,
    N: Notifier + ?Sized,
{
    profile.validate()?;

    // The store keeps whole seconds.
    let now = now.trunc_subsecs(0);

    let batch = source.fetch()?;
    let mut summary = RunSummary {
        fetched: batch.listings.len() + batch.undecodable,
        undecodable: batch.undecodable,
        ..RunSummary::default()
    };

    let filtered = filter_listings(&batch.listings, &profile.criteria);
    summary.malformed = filtered.malformed;
    summary.rejected = filtered.rejected;
    summary.matched = filtered.matched.len();
    if filtered.malformed + batch.undecodable > 0 {
        tracing::warn!(
            malformed = filtered.malformed,
            undecodable = batch.undecodable,
            "skipped listings that could not be normalized"
        );
    }
    tracing::info!(
        matched = summary.matched,
        rejected = summary.rejected,
        "filter complete"
    );

    let mut degraded = false;
    let log = match store.load() {
        Ok(log) => log,
        Err(PipelineError::DuplicateState(reason)) => {
            tracing::warn!(%reason, "seen log unreadable; treating every match as new");
            degraded = true;
            SeenListingsLog::new()
        }
        Err(e) => return Err(e),
    };
    if log.is_empty() && !degraded {
        tracing::info!("seen log is empty; every match counts as new");
    }

    let dedup = partition_novel(filtered.matched, &log, now);
    summary.already_seen = dedup.already_seen.len();
    summary.novel = dedup.novel.len();
    tracing::info!(
        novel = summary.novel,
        already_seen = summary.already_seen,
        known = log.len(),
        "dedup complete"
    );

    let report = build_report(&dedup.novel, &profile.criteria, &profile.recipients, now)?;

    if let Some(dir) = options.export_dir.as_deref() {
        if report.is_empty() {
            tracing::debug!("nothing new to export");
        } else {
            match export_listings(&dedup.novel, dir, options.export_format, now) {
                Ok(path) => summary.export = Some(path),
                Err(e) => tracing::warn!(error = %e, "export skipped; delivering anyway"),
            }
        }
    }

    match notifier.deliver(&report) {
        Ok(()) => summary.delivered = true,
        Err(e) => {
            tracing::error!(error = %e, "report not delivered; seen log left unchanged");
            return Ok(summary);
        }
    }

    if options.dry_run {
        tracing::info!("dry run; seen log left unchanged");
    } else {
        if degraded {
            store.reset(now)?;
        }
        summary.persisted = store.persist(&dedup.updated_log)?;
    }

    Ok(summary)
}
