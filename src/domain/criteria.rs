// src/domain/criteria.rs

use crate::domain::listing::{ListingRecord, PropertyType};
use crate::errors::PipelineError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The static filter a run is evaluated against. Loaded once per run and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCriteria {
    pub min_price: u64,
    pub max_price: u64,
    pub min_year_built: i32,
    pub max_year_built: i32,

    #[serde(default = "default_property_types")]
    pub property_types: BTreeSet<PropertyType>,

    #[serde(default)]
    pub min_bedrooms: u32,
    #[serde(default)]
    pub min_bathrooms: f64,
    #[serde(default)]
    pub min_sqft: u32,
    #[serde(default)]
    pub max_sqft: Option<u32>,

    /// Empty means every zip code is accepted.
    #[serde(default)]
    pub zip_codes: BTreeSet<String>,
}

fn default_property_types() -> BTreeSet<PropertyType> {
    BTreeSet::from([PropertyType::House])
}

/// One field-level check. A run normally evaluates all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    Price,
    YearBuilt,
    PropertyType,
    Bedrooms,
    Bathrooms,
    SquareFeet,
    ZipCode,
}

impl Predicate {
    pub const ALL: [Predicate; 7] = [
        Predicate::Price,
        Predicate::YearBuilt,
        Predicate::PropertyType,
        Predicate::Bedrooms,
        Predicate::Bathrooms,
        Predicate::SquareFeet,
        Predicate::ZipCode,
    ];
}

impl SearchCriteria {
    /// Rejects criteria that could never match anything sensible.
    /// Every problem is reported at once.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let mut issues: Vec<String> = Vec::new();

        if self.min_price > self.max_price {
            issues.push(format!(
                "min_price ({}) must be <= max_price ({})",
                self.min_price, self.max_price
            ));
        }
        if self.min_year_built > self.max_year_built {
            issues.push(format!(
                "min_year_built ({}) must be <= max_year_built ({})",
                self.min_year_built, self.max_year_built
            ));
        }
        if self.property_types.is_empty() {
            issues.push("property_types must contain at least one type".into());
        }
        if !self.min_bathrooms.is_finite() || self.min_bathrooms < 0.0 {
            issues.push("min_bathrooms must be a number >= 0".into());
        }
        if let Some(max_sqft) = self.max_sqft {
            if self.min_sqft > max_sqft {
                issues.push(format!(
                    "min_sqft ({}) must be <= max_sqft ({max_sqft})",
                    self.min_sqft
                ));
            }
        }
        for zip in &self.zip_codes {
            if zip.len() != 5 || !zip.chars().all(|c| c.is_ascii_digit()) {
                issues.push(format!("zip code '{zip}' must be five digits"));
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(PipelineError::Configuration(format!(
                "Invalid search criteria:\n - {}",
                issues.join("\n - ")
            )))
        }
    }

    pub fn admits(&self, predicate: Predicate, rec: &ListingRecord) -> bool {
        match predicate {
            Predicate::Price => (self.min_price..=self.max_price).contains(&rec.price),
            Predicate::YearBuilt => {
                (self.min_year_built..=self.max_year_built).contains(&rec.year_built)
            }
            Predicate::PropertyType => self.property_types.contains(&rec.property_type),
            Predicate::Bedrooms => rec.bedrooms >= self.min_bedrooms,
            Predicate::Bathrooms => rec.bathrooms >= self.min_bathrooms,
            Predicate::SquareFeet => {
                rec.sqft >= self.min_sqft && self.max_sqft.map_or(true, |max| rec.sqft <= max)
            }
            Predicate::ZipCode => {
                self.zip_codes.is_empty() || self.zip_codes.contains(&rec.zip_code)
            }
        }
    }

    #[cfg(test)]
    pub fn matches(&self, rec: &ListingRecord) -> bool {
        Predicate::ALL.iter().all(|p| self.admits(*p, rec))
    }

    pub fn property_types_label(&self) -> String {
        self.property_types
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
