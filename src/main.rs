use crate::config::{load_config, AppConfig};
use crate::db::{RunLock, SeenStore, SqliteSeenStore};
use crate::errors::{PipelineError, PipelineResult};
use crate::mailer::{BrevoMailer, Notifier, OutboxMailer};
use crate::pipeline::{run_pipeline, RunOptions};
use crate::source::JsonFileSource;
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod config;
mod db;
mod domain;
mod errors;
mod mailer;
mod pipeline;
mod report;
mod source;
mod spreadsheets;
mod templates;

#[cfg(test)]
mod tests;

/// Daily house-listing watch: filter a fetched batch, report what is new.
#[derive(Debug, Parser)]
#[command(name = "listing_watch", version)]
struct Cli {
    /// Config file (default: ./listing_watch.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Filter, dedup and report one batch (default)
    Run {
        /// Fetcher output (JSON). Overrides the configured input.
        #[arg(long)]
        input: Option<PathBuf>,
        /// Search profile to evaluate
        #[arg(long)]
        profile: Option<String>,
        /// Write the report to the outbox and leave the seen log untouched
        #[arg(long)]
        dry_run: bool,
    },
    /// Forget seen listings older than N days
    Prune {
        #[arg(long)]
        older_than_days: u32,
    },
    /// Validate configuration and exit
    CheckConfig {
        #[arg(long)]
        profile: Option<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("listing_watch=info")),
        )
        .init();

    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Run {
        input: None,
        profile: None,
        dry_run: false,
    });

    let result = load_config(cli.config.as_deref()).and_then(|config| match command {
        Command::Run {
            input,
            profile,
            dry_run,
        } => run(&config, input, profile.as_deref(), dry_run),
        Command::Prune { older_than_days } => prune(&config, older_than_days),
        Command::CheckConfig { profile } => check_config(&config, profile.as_deref()),
    });

    if let Err(e) = result {
        tracing::error!("{e}");
        std::process::exit(e.exit_code());
    }
}

fn run(
    config: &AppConfig,
    input: Option<PathBuf>,
    profile_name: Option<&str>,
    dry_run: bool,
) -> PipelineResult<()> {
    let profile = config.profile(profile_name)?;
    let input = input.or_else(|| config.input.clone()).ok_or_else(|| {
        PipelineError::Configuration("no input file (use --input or set `input`)".into())
    })?;

    let _lock = RunLock::acquire(&config.store_path)?;

    let mut source = JsonFileSource::new(input, config.source_name.clone());
    let mut store = SqliteSeenStore::new(&config.store_path);
    let notifier = notifier_for(config, dry_run)?;
    let options = RunOptions {
        dry_run,
        export_dir: config.export_dir.clone(),
        export_format: config.export_format,
    };

    let summary = run_pipeline(
        &profile,
        &mut source,
        &mut store,
        notifier.as_ref(),
        &options,
        Utc::now(),
    )?;

    tracing::info!("run complete: {summary}");
    Ok(())
}

fn notifier_for(config: &AppConfig, dry_run: bool) -> PipelineResult<Box<dyn Notifier>> {
    if dry_run || config.mail.api_key.is_empty() {
        if !dry_run {
            tracing::warn!("BREVO_API_KEY not set; writing report to outbox");
        }
        return Ok(Box::new(OutboxMailer::new(&config.outbox_dir)));
    }

    Ok(Box::new(BrevoMailer::new(
        config.mail.api_key.clone(),
        config.mail.sender_email.clone(),
        config.mail.sender_name.clone(),
    )?))
}

fn prune(config: &AppConfig, older_than_days: u32) -> PipelineResult<()> {
    let cutoff = Utc::now() - Duration::days(i64::from(older_than_days));

    let _lock = RunLock::acquire(&config.store_path)?;
    let removed = SqliteSeenStore::new(&config.store_path).prune_before(cutoff)?;

    tracing::info!(removed, cutoff = %cutoff, "seen log pruned");
    Ok(())
}

fn check_config(config: &AppConfig, profile_name: Option<&str>) -> PipelineResult<()> {
    let profile = config.profile(profile_name)?;
    tracing::info!(
        profile = profile_name.unwrap_or(&config.default_profile),
        recipients = profile.recipients.len(),
        store = %config.store_path.display(),
        "configuration OK"
    );
    Ok(())
}
