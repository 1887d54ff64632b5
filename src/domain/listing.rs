// src/domain/listing.rs

use crate::errors::MalformedRecord;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use url::Url;

/// A scalar as providers send it: numbers sometimes arrive as text
/// ("$350,000", "1,850"), ids sometimes as numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Int(i64),
    Float(f64),
    Text(String),
}

/// A listing exactly as a fetcher delivered it. Every field is optional;
/// `ListingRecord::from_raw` decides what is usable.
///
/// Aliases cover the key spellings used by the providers we have seen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawListing {
    #[serde(default, alias = "listing_id", alias = "listingId", alias = "zpid")]
    pub id: Option<RawValue>,
    #[serde(default)]
    pub source: Option<String>,

    #[serde(default, alias = "streetAddress", alias = "address_line")]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default, alias = "state_code")]
    pub state: Option<String>,
    #[serde(
        default,
        alias = "zipCode",
        alias = "zipcode",
        alias = "postal_code"
    )]
    pub zip_code: Option<RawValue>,

    #[serde(default, alias = "listPrice", alias = "list_price")]
    pub price: Option<RawValue>,
    #[serde(default, alias = "beds")]
    pub bedrooms: Option<RawValue>,
    #[serde(default, alias = "baths")]
    pub bathrooms: Option<RawValue>,
    #[serde(
        default,
        alias = "livingArea",
        alias = "squareFeet",
        alias = "square_feet"
    )]
    pub sqft: Option<RawValue>,
    #[serde(default, alias = "yearBuilt")]
    pub year_built: Option<RawValue>,
    #[serde(default, alias = "home_type", alias = "homeType")]
    pub property_type: Option<String>,

    #[serde(default, alias = "detailUrl", alias = "hdpUrl")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    House,
    Townhome,
    Condo,
    Other,
}

impl PropertyType {
    /// Maps a provider's free-form type label onto our four buckets.
    pub fn from_label(label: &str) -> Self {
        let label = label.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        if label.contains("townho") {
            return PropertyType::Townhome;
        }
        if label.contains("condo") || label.contains("apartment") {
            return PropertyType::Condo;
        }
        match label.as_str() {
            "house" | "houses" | "single_family" | "singlefamily" | "single_family_home" => {
                PropertyType::House
            }
            _ => PropertyType::Other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PropertyType::House => "house",
            PropertyType::Townhome => "townhome",
            PropertyType::Condo => "condo",
            PropertyType::Other => "other",
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized listing. Lives for one run only; only `id` is persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingRecord {
    /// `source:listing_id`, stable across runs for the same listing.
    pub id: String,
    pub address: String,
    pub zip_code: String,
    /// Whole dollars.
    pub price: u64,
    pub bedrooms: u32,
    pub bathrooms: f64,
    pub sqft: u32,
    pub year_built: i32,
    pub property_type: PropertyType,
    pub source: String,
    pub url: String,
}

const MIN_PLAUSIBLE_YEAR: i64 = 1600;
const MAX_PLAUSIBLE_YEAR: i64 = 2100;

impl ListingRecord {
    /// Validates and flattens a raw record. Missing or unparseable fields
    /// reject the record; nothing is defaulted.
    pub fn from_raw(raw: &RawListing) -> Result<Self, MalformedRecord> {
        let source = non_empty(raw.source.as_deref())
            .ok_or(MalformedRecord::missing("source"))?
            .to_string();

        let street = non_empty(raw.address.as_deref()).ok_or(MalformedRecord::missing("address"))?;

        let zip_code = match raw.zip_code.as_ref() {
            Some(v) => normalize_zip(v)?,
            None => return Err(MalformedRecord::missing("zip_code")),
        };

        let address = compose_address(
            street,
            non_empty(raw.city.as_deref()),
            non_empty(raw.state.as_deref()),
            &zip_code,
        );

        let price = parse_whole(raw.price.as_ref(), "price")?;
        let bedrooms = parse_whole(raw.bedrooms.as_ref(), "bedrooms")?;
        let bathrooms = parse_rational(raw.bathrooms.as_ref(), "bathrooms")?;
        let sqft = parse_whole(raw.sqft.as_ref(), "sqft")?;

        let year_built = parse_whole(raw.year_built.as_ref(), "year_built")?;
        if !(MIN_PLAUSIBLE_YEAR..=MAX_PLAUSIBLE_YEAR).contains(&(year_built as i64)) {
            return Err(MalformedRecord::invalid(
                "year_built",
                format!("{year_built} is not a plausible year"),
            ));
        }

        let property_type = non_empty(raw.property_type.as_deref())
            .map(PropertyType::from_label)
            .ok_or(MalformedRecord::missing("property_type"))?;

        let url = resolve_url(&source, raw.url.as_deref())?;

        let id = match raw.id.as_ref().and_then(raw_id_text) {
            Some(listing_id) => make_scoped_id(&source, &listing_id),
            None => address_fingerprint(&source, &address),
        };

        Ok(ListingRecord {
            id,
            address,
            zip_code,
            price,
            bedrooms: to_u32(bedrooms, "bedrooms")?,
            bathrooms,
            sqft: to_u32(sqft, "sqft")?,
            year_built: year_built as i32,
            property_type,
            source,
            url,
        })
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

pub fn make_scoped_id(source: &str, raw_id: &str) -> String {
    format!("{}:{}", source.trim().to_lowercase(), raw_id.trim())
}

/// Fallback identity for providers that send no listing id: same source
/// and same address give the same id.
fn address_fingerprint(source: &str, address: &str) -> String {
    let normalized = address
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    let mut hasher = Sha256::new();
    hasher.update(source.trim().to_lowercase().as_bytes());
    hasher.update(b"\n");
    hasher.update(normalized.as_bytes());
    let digest = format!("{:x}", hasher.finalize());

    make_scoped_id(source, &format!("addr-{}", &digest[..16]))
}

fn raw_id_text(v: &RawValue) -> Option<String> {
    match v {
        RawValue::Int(i) => Some(i.to_string()),
        RawValue::Float(f) if f.fract() == 0.0 => Some(format!("{}", *f as i64)),
        RawValue::Float(_) => None,
        RawValue::Text(s) => non_empty(Some(s)).map(str::to_string),
    }
}

fn compose_address(street: &str, city: Option<&str>, state: Option<&str>, zip: &str) -> String {
    match (city, state) {
        (Some(city), _) if street.contains(city) => street.to_string(),
        (Some(city), Some(state)) => format!("{street}, {city}, {state} {zip}"),
        (Some(city), None) => format!("{street}, {city} {zip}"),
        (None, _) => street.to_string(),
    }
}

fn normalize_zip(v: &RawValue) -> Result<String, MalformedRecord> {
    let text = match v {
        RawValue::Int(i) if (0..=99_999).contains(i) => format!("{i:05}"),
        RawValue::Text(s) => s.trim().to_string(),
        _ => return Err(MalformedRecord::invalid("zip_code", "not a zip code")),
    };

    // ZIP+4 is reduced to the five-digit prefix.
    let prefix: String = text.chars().take(5).collect();
    if prefix.len() == 5 && prefix.chars().all(|c| c.is_ascii_digit()) {
        Ok(prefix)
    } else {
        Err(MalformedRecord::invalid(
            "zip_code",
            format!("'{text}' is not a zip code"),
        ))
    }
}

/// Strips the decoration providers put around numbers ("$", ",", units).
fn clean_numeric_text(s: &str) -> String {
    let trimmed = s.trim();
    let trimmed = trimmed
        .strip_suffix("sqft")
        .or_else(|| trimmed.strip_suffix("sq ft"))
        .unwrap_or(trimmed);
    trimmed
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' '))
        .collect()
}

fn parse_whole(v: Option<&RawValue>, field: &'static str) -> Result<u64, MalformedRecord> {
    let v = v.ok_or(MalformedRecord::missing(field))?;
    let n: i64 = match v {
        RawValue::Int(i) => *i,
        RawValue::Float(f) if f.is_finite() && f.fract() == 0.0 => *f as i64,
        RawValue::Float(f) => {
            return Err(MalformedRecord::invalid(field, format!("{f} is not whole")))
        }
        RawValue::Text(s) => clean_numeric_text(s)
            .parse::<i64>()
            .map_err(|_| MalformedRecord::invalid(field, format!("'{s}' is not a number")))?,
    };
    u64::try_from(n).map_err(|_| MalformedRecord::invalid(field, format!("{n} is negative")))
}

fn parse_rational(v: Option<&RawValue>, field: &'static str) -> Result<f64, MalformedRecord> {
    let v = v.ok_or(MalformedRecord::missing(field))?;
    let n = match v {
        RawValue::Int(i) => *i as f64,
        RawValue::Float(f) => *f,
        RawValue::Text(s) => clean_numeric_text(s)
            .parse::<f64>()
            .map_err(|_| MalformedRecord::invalid(field, format!("'{s}' is not a number")))?,
    };
    if !n.is_finite() || n < 0.0 {
        return Err(MalformedRecord::invalid(field, format!("{n} is out of range")));
    }
    Ok(n)
}

fn to_u32(n: u64, field: &'static str) -> Result<u32, MalformedRecord> {
    u32::try_from(n).map_err(|_| MalformedRecord::invalid(field, format!("{n} is too large")))
}

/// Site roots for sources that hand out relative detail links.
fn source_base_url(source: &str) -> Option<&'static str> {
    let source = source.to_ascii_lowercase();
    if source.contains("zillow") {
        Some("https://www.zillow.com")
    } else if source.contains("realtor") {
        Some("https://www.realtor.com")
    } else {
        None
    }
}

fn resolve_url(source: &str, raw: Option<&str>) -> Result<String, MalformedRecord> {
    let raw = non_empty(raw).ok_or(MalformedRecord::missing("url"))?;

    match Url::parse(raw) {
        Ok(url) => Ok(url.to_string()),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let base = source_base_url(source).ok_or_else(|| {
                MalformedRecord::invalid("url", format!("relative link '{raw}' from {source}"))
            })?;
            Url::parse(base)
                .and_then(|b| b.join(raw))
                .map(|u| u.to_string())
                .map_err(|e| MalformedRecord::invalid("url", e.to_string()))
        }
        Err(e) => Err(MalformedRecord::invalid("url", e.to_string())),
    }
}
