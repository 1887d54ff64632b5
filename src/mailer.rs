// src/mailer.rs

use crate::errors::PipelineError;
use crate::report::Report;
use reqwest::blocking::Client;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

const BREVO_SEND_URL: &str = "https://api.brevo.com/v3/smtp/email";

/// Hands a finished report to whatever delivers it. Implementations do not
/// retry; a failure is returned as `PipelineError::Delivery`.
pub trait Notifier {
    fn deliver(&self, report: &Report) -> Result<(), PipelineError>;
}

pub struct BrevoMailer {
    api_key: String,
    sender_email: String,
    sender_name: String,
    endpoint: String,
    client: Client,
}

#[derive(Serialize)]
struct BrevoSender<'a> {
    name: &'a str,
    email: &'a str,
}

#[derive(Serialize)]
struct BrevoRecipient<'a> {
    email: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BrevoPayload<'a> {
    sender: BrevoSender<'a>,
    to: Vec<BrevoRecipient<'a>>,
    subject: &'a str,
    html_content: &'a str,
    text_content: &'a str,
}

impl BrevoMailer {
    pub fn new(
        api_key: String,
        sender_email: String,
        sender_name: String,
    ) -> Result<Self, PipelineError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| PipelineError::Delivery(format!("HTTP client init failed: {e}")))?;

        Ok(Self {
            api_key,
            sender_email,
            sender_name,
            endpoint: BREVO_SEND_URL.to_string(),
            client,
        })
    }

    #[cfg(test)]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn payload<'a>(&'a self, report: &'a Report) -> BrevoPayload<'a> {
        BrevoPayload {
            sender: BrevoSender {
                name: &self.sender_name,
                email: &self.sender_email,
            },
            to: report
                .recipients
                .iter()
                .map(|email| BrevoRecipient {
                    email: email.as_str(),
                })
                .collect(),
            subject: &report.subject,
            html_content: &report.html,
            text_content: &report.text,
        }
    }
}

impl Notifier for BrevoMailer {
    fn deliver(&self, report: &Report) -> Result<(), PipelineError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .header("api-key", &self.api_key)
            .json(&self.payload(report))
            .send()
            .map_err(|e| PipelineError::Delivery(format!("Request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().unwrap_or_else(|_| "(no body)".to_string());
            return Err(PipelineError::Delivery(format!(
                "Mail API error: {status} - {body}"
            )));
        }

        tracing::info!(
            recipients = report.recipients.len(),
            listings = report.listing_count,
            "report e-mailed"
        );
        Ok(())
    }
}

/// Writes the report to disk instead of sending it. Used for dry runs and
/// as a CI artifact.
pub struct OutboxMailer {
    dir: PathBuf,
}

impl OutboxMailer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, report: &Report) -> PathBuf {
        self.dir.join(format!(
            "report_{}.html",
            report.generated_at.format("%Y%m%d_%H%M%S")
        ))
    }
}

impl Notifier for OutboxMailer {
    fn deliver(&self, report: &Report) -> Result<(), PipelineError> {
        let path = self.path_for(report);
        std::fs::create_dir_all(&self.dir)
            .and_then(|_| std::fs::write(&path, &report.html))
            .map_err(|e| {
                PipelineError::Delivery(format!("Failed to write {}: {e}", path.display()))
            })?;

        tracing::info!(
            path = %path.display(),
            recipients = %report.recipients.join(", "),
            "report written to outbox"
        );
        Ok(())
    }
}
