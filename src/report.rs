// src/report.rs

use crate::domain::{ListingRecord, SearchCriteria};
use crate::errors::PipelineError;
use crate::templates::format::{baths, dollars, sqft_range, thousands};
use crate::templates::report_page;
use chrono::{DateTime, Utc};
use std::fmt::Write as _;

/// Everything a notifier needs to deliver one run's results.
#[derive(Debug, Clone)]
pub struct Report {
    pub subject: String,
    pub html: String,
    pub text: String,
    pub recipients: Vec<String>,
    pub listing_count: usize,
    pub generated_at: DateTime<Utc>,
}

impl Report {
    pub fn is_empty(&self) -> bool {
        self.listing_count == 0
    }
}

pub fn subject_for(count: usize) -> String {
    match count {
        0 => "Daily House Listings - no new matches".to_string(),
        1 => "Daily House Listings - 1 new listing found".to_string(),
        n => format!("Daily House Listings - {n} new listings found"),
    }
}

/// Loose sanity check; the mail provider does the real validation.
pub fn is_plausible_email(addr: &str) -> bool {
    let Some((local, domain)) = addr.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !addr.chars().any(char::is_whitespace)
}

/// Formats the novel listings of a run. An empty slice still yields a
/// complete "no new matches" report.
pub fn build_report(
    novel: &[ListingRecord],
    criteria: &SearchCriteria,
    recipients: &[String],
    generated_at: DateTime<Utc>,
) -> Result<Report, PipelineError> {
    if recipients.is_empty() {
        return Err(PipelineError::Report("no recipients configured".into()));
    }
    if let Some(bad) = recipients.iter().find(|r| !is_plausible_email(r)) {
        return Err(PipelineError::Report(format!(
            "'{bad}' is not a valid recipient address"
        )));
    }

    let subject = subject_for(novel.len());
    let html = report_page(&subject, novel, criteria, generated_at).into_string();
    let text = plain_text(novel, criteria, generated_at)
        .map_err(|e| PipelineError::Report(format!("Failed to format text body: {e}")))?;

    Ok(Report {
        subject,
        html,
        text,
        recipients: recipients.to_vec(),
        listing_count: novel.len(),
        generated_at,
    })
}

fn plain_text(
    novel: &[ListingRecord],
    criteria: &SearchCriteria,
    generated_at: DateTime<Utc>,
) -> Result<String, std::fmt::Error> {
    let mut out = String::new();

    writeln!(out, "Daily House Listings Report")?;
    writeln!(out, "Date: {}", generated_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
    writeln!(out, "New Listings: {}", novel.len())?;
    writeln!(out)?;

    if novel.is_empty() {
        writeln!(out, "No new matches since the last report.")?;
    }
    for (i, l) in novel.iter().enumerate() {
        writeln!(out, "{}. {} - {}", i + 1, dollars(l.price), l.address)?;
        writeln!(
            out,
            "   {} bed, {} bath, {} sqft, built {} ({}, {})",
            l.bedrooms,
            baths(l.bathrooms),
            thousands(l.sqft as u64),
            l.year_built,
            l.property_type,
            l.source
        )?;
        writeln!(out, "   {}", l.url)?;
    }

    writeln!(out)?;
    writeln!(out, "Search Criteria")?;
    writeln!(
        out,
        "  Price: {} - {}",
        dollars(criteria.min_price),
        dollars(criteria.max_price)
    )?;
    writeln!(
        out,
        "  Year Built: {} - {}",
        criteria.min_year_built, criteria.max_year_built
    )?;
    writeln!(out, "  Types: {}", criteria.property_types_label())?;
    writeln!(
        out,
        "  Min Beds/Baths: {} / {}",
        criteria.min_bedrooms,
        baths(criteria.min_bathrooms)
    )?;
    writeln!(
        out,
        "  Square Feet: {}",
        sqft_range(criteria.min_sqft, criteria.max_sqft)
    )?;
    if !criteria.zip_codes.is_empty() {
        let zips: Vec<&str> = criteria.zip_codes.iter().map(String::as_str).collect();
        writeln!(out, "  Zip Codes: {}", zips.join(", "))?;
    }

    Ok(out)
}
