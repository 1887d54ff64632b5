//! Configuration loader: defaults, then `listing_watch.toml`, then `.env`
//! and environment variables (highest priority).

use crate::domain::{PropertyType, SearchCriteria};
use crate::errors::PipelineError;
use crate::report::is_plausible_email;
use crate::spreadsheets::ExportFormat;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "listing_watch.toml";

/// Top-level configuration for one invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// SQLite file holding the seen-listings log.
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    /// Fetcher output read when `--input` is not given.
    #[serde(default)]
    pub input: Option<PathBuf>,

    /// Source name stamped on records that carry none.
    #[serde(default)]
    pub source_name: Option<String>,

    /// Directory for exports; no export when unset.
    #[serde(default)]
    pub export_dir: Option<PathBuf>,

    /// `xlsx` (default) or `csv`.
    #[serde(default)]
    pub export_format: ExportFormat,

    /// Where dry runs (or runs without a mail API key) leave the report.
    #[serde(default = "default_outbox_dir")]
    pub outbox_dir: PathBuf,

    #[serde(default)]
    pub mail: MailConfig,

    /// Profile used when `--profile` is not given.
    #[serde(default = "default_profile_name")]
    pub default_profile: String,

    /// Named search areas. Each run evaluates exactly one.
    #[serde(default = "default_profiles")]
    pub profiles: BTreeMap<String, SearchProfile>,

    /// Set from `LISTING_WATCH_RECIPIENTS`; replaces the profile's list.
    #[serde(skip)]
    pub recipients_override: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// Transactional mail API key. Normally supplied as `BREVO_API_KEY`.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_sender_email")]
    pub sender_email: String,
    #[serde(default = "default_sender_name")]
    pub sender_name: String,
}

/// Criteria plus the people who get the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchProfile {
    pub criteria: SearchCriteria,
    #[serde(default)]
    pub recipients: Vec<String>,
}

// ── Defaults ──────────────────────────────────────────────────────────

fn default_store_path() -> PathBuf {
    PathBuf::from("seen_listings.sqlite3")
}

fn default_outbox_dir() -> PathBuf {
    PathBuf::from("outbox")
}

fn default_profile_name() -> String {
    "default".into()
}

fn default_sender_email() -> String {
    "listings@localhost.localdomain".into()
}

fn default_sender_name() -> String {
    "House Listing Watch".into()
}

fn default_criteria() -> SearchCriteria {
    SearchCriteria {
        min_price: 200_000,
        max_price: 405_000,
        min_year_built: 1980,
        max_year_built: 2020,
        property_types: BTreeSet::from([PropertyType::House]),
        min_bedrooms: 2,
        min_bathrooms: 1.0,
        min_sqft: 1300,
        max_sqft: Some(5000),
        zip_codes: BTreeSet::new(),
    }
}

fn default_profiles() -> BTreeMap<String, SearchProfile> {
    BTreeMap::from([(
        default_profile_name(),
        SearchProfile {
            criteria: default_criteria(),
            recipients: Vec::new(),
        },
    )])
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            sender_email: default_sender_email(),
            sender_name: default_sender_name(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            input: None,
            source_name: None,
            export_dir: None,
            export_format: ExportFormat::default(),
            outbox_dir: default_outbox_dir(),
            mail: MailConfig::default(),
            default_profile: default_profile_name(),
            profiles: default_profiles(),
            recipients_override: None,
        }
    }
}

fn parse_recipients(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl AppConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, PipelineError> {
        toml::from_str(contents)
            .map_err(|e| PipelineError::Configuration(format!("Failed to parse config: {e}")))
    }

    /// Applies environment overrides. `lookup` is `std::env::var` in
    /// production and a map in tests.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), PipelineError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let set = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(path) = set("LISTING_WATCH_STORE") {
            self.store_path = PathBuf::from(path);
        }
        if let Some(path) = set("LISTING_WATCH_INPUT") {
            self.input = Some(PathBuf::from(path));
        }
        if let Some(dir) = set("LISTING_WATCH_EXPORT_DIR") {
            self.export_dir = Some(PathBuf::from(dir));
        }
        if let Some(name) = set("LISTING_WATCH_EXPORT_FORMAT") {
            self.export_format = ExportFormat::from_name(&name).ok_or_else(|| {
                PipelineError::Configuration(format!(
                    "LISTING_WATCH_EXPORT_FORMAT must be xlsx or csv, got '{name}'"
                ))
            })?;
        }
        if let Some(dir) = set("LISTING_WATCH_OUTBOX") {
            self.outbox_dir = PathBuf::from(dir);
        }
        if let Some(key) = set("BREVO_API_KEY") {
            self.mail.api_key = key;
        }
        if let Some(email) = set("LISTING_WATCH_SENDER") {
            self.mail.sender_email = email;
        }
        if let Some(raw) = set("LISTING_WATCH_RECIPIENTS") {
            self.recipients_override = Some(parse_recipients(&raw));
        }
        Ok(())
    }

    /// Resolves and validates the profile for this run.
    pub fn profile(&self, name: Option<&str>) -> Result<SearchProfile, PipelineError> {
        let name = name.unwrap_or(&self.default_profile);
        let mut profile = self.profiles.get(name).cloned().ok_or_else(|| {
            let known: Vec<&str> = self.profiles.keys().map(String::as_str).collect();
            PipelineError::Configuration(format!(
                "unknown profile '{name}' (known: {})",
                known.join(", ")
            ))
        })?;

        if let Some(recipients) = &self.recipients_override {
            profile.recipients = recipients.clone();
        }

        profile.validate().map_err(|e| match e {
            PipelineError::Configuration(msg) => {
                PipelineError::Configuration(format!("profile '{name}': {msg}"))
            }
            other => other,
        })?;
        Ok(profile)
    }
}

impl SearchProfile {
    pub fn validate(&self) -> Result<(), PipelineError> {
        self.criteria.validate()?;

        if self.recipients.is_empty() {
            return Err(PipelineError::Configuration(
                "at least one recipient is required".into(),
            ));
        }
        if let Some(bad) = self.recipients.iter().find(|r| !is_plausible_email(r)) {
            return Err(PipelineError::Configuration(format!(
                "'{bad}' is not a valid recipient address"
            )));
        }
        Ok(())
    }
}

/// Loads configuration from `path` (or `listing_watch.toml` when present),
/// then overlays `.env` and the process environment.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, PipelineError> {
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("No .env file loaded: {}", e);
    }

    let explicit = path.is_some();
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));

    let mut config = if path.exists() {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::Configuration(format!("Failed to read {}: {e}", path.display()))
        })?;
        AppConfig::from_toml_str(&contents)?
    } else if explicit {
        return Err(PipelineError::Configuration(format!(
            "config file {} not found",
            path.display()
        )));
    } else {
        tracing::debug!("No {DEFAULT_CONFIG_FILE}; using built-in defaults");
        AppConfig::default()
    };

    config.apply_env(|key| std::env::var(key).ok())?;
    Ok(config)
}
