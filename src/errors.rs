// errors.rs
use thiserror::Error;

/// Errors raised by a single pipeline run.
///
/// `Configuration` and the I/O-ish variants abort the run. `DuplicateState`
/// and `Delivery` are logged by the run driver and the run carries on.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Malformed record: {0}")]
    Malformed(#[from] MalformedRecord),

    #[error("Seen-listings log unreadable: {0}")]
    DuplicateState(String),

    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("Input error: {0}")]
    Input(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Report error: {0}")]
    Report(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Process exit status for run-level failures.
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::Configuration(_) => 2,
            _ => 1,
        }
    }
}

/// A raw record that could not be normalized. Absorbed per record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {reason}")]
pub struct MalformedRecord {
    pub field: &'static str,
    pub reason: String,
}

impl MalformedRecord {
    pub fn missing(field: &'static str) -> Self {
        Self {
            field,
            reason: "missing".to_string(),
        }
    }

    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
