//! Flattening of raw listing blobs into export-ready rows.
//!
//! Records go through four ordered passes. A record that is missing something a
//! pass needs is flagged invalid; later passes leave it alone and it is dropped
//! (and counted) at the end instead of failing the run.

use crate::models::{value_text, NormalizedListing, RawListing};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::{debug, warn};

static PRICE_NOISE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\d$,]").expect("valid price pattern"));

/// Text form of the floor size, e.g. `{'value': '1,800', 'unitText': 'sqft'}`
static FLOOR_SIZE_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"['"]value['"]\s*:\s*(?:'([^']*)'|"([^"]*)"|([\d.,]+))"#)
        .expect("valid floor size pattern")
});

#[derive(Debug, Clone, PartialEq, Error)]
pub enum NormalizeError {
    #[error("missing field `{0}`")]
    MissingField(&'static str),
}

/// Outcome of normalizing one page of listings
#[derive(Debug, Default)]
pub struct Normalized {
    pub listings: Vec<NormalizedListing>,
    pub dropped: usize,
}

struct Draft {
    raw: RawListing,
    listing: NormalizedListing,
    invalid: Option<NormalizeError>,
}

pub fn normalize(raw: Vec<RawListing>) -> Normalized {
    let mut drafts: Vec<Draft> = raw
        .into_iter()
        .map(|raw| Draft {
            raw,
            listing: NormalizedListing::default(),
            invalid: None,
        })
        .collect();

    run_pass(&mut drafts, price_pass);
    run_pass(&mut drafts, floor_size_pass);
    run_pass(&mut drafts, address_pass);
    run_pass(&mut drafts, geo_pass);

    let mut normalized = Normalized::default();
    for (idx, mut draft) in drafts.into_iter().enumerate() {
        match draft.invalid {
            Some(reason) => {
                warn!("Dropped listing {}: {}", idx, reason);
                normalized.dropped += 1;
            }
            None => {
                draft.listing.extra = std::mem::take(&mut draft.raw.extra);
                normalized.listings.push(draft.listing);
            }
        }
    }

    debug!(
        "Normalized {} listings ({} dropped)",
        normalized.listings.len(),
        normalized.dropped
    );

    normalized
}

fn run_pass(drafts: &mut [Draft], pass: fn(&mut Draft) -> Result<(), NormalizeError>) {
    for draft in drafts.iter_mut().filter(|d| d.invalid.is_none()) {
        if let Err(reason) = pass(draft) {
            draft.invalid = Some(reason);
        }
    }
}

fn price_pass(draft: &mut Draft) -> Result<(), NormalizeError> {
    // `@context` and `@type` have no place in NormalizedListing and die with the raw blob
    draft.listing.price = clean_price(&draft.raw.price.concat());
    Ok(())
}

fn floor_size_pass(draft: &mut Draft) -> Result<(), NormalizeError> {
    let floor_size = draft
        .raw
        .floor_size
        .take()
        .ok_or(NormalizeError::MissingField("floorSize"))?;
    draft.listing.floor_size = floor_size_digits(&floor_size);
    Ok(())
}

fn address_pass(draft: &mut Draft) -> Result<(), NormalizeError> {
    let address = draft
        .raw
        .address
        .take()
        .ok_or(NormalizeError::MissingField("address"))?;
    let listing = &mut draft.listing;

    listing.street_address = required_text(address.street_address, "address.streetAddress")?;
    listing.city = required_text(address.address_locality, "address.addressLocality")?;
    listing.state = required_text(address.address_region, "address.addressRegion")?;
    listing.zip = required_text(address.postal_code, "address.postalCode")?;
    listing.full_address = draft
        .raw
        .name
        .take()
        .ok_or(NormalizeError::MissingField("name"))?;

    Ok(())
}

fn required_text(value: Option<Value>, field: &'static str) -> Result<String, NormalizeError> {
    value
        .as_ref()
        .map(value_text)
        .ok_or(NormalizeError::MissingField(field))
}

fn geo_pass(draft: &mut Draft) -> Result<(), NormalizeError> {
    let geo = draft
        .raw
        .geo
        .take()
        .ok_or(NormalizeError::MissingField("geo"))?;
    draft.listing.latitude = geo.latitude;
    draft.listing.longitude = geo.longitude;
    Ok(())
}

/// Keep only digits, `$` and `,`: `"Price reduced $450,000!"` becomes `"$450,000"`.
pub fn clean_price(raw: &str) -> String {
    PRICE_NOISE.replace_all(raw, "").into_owned()
}

/// Digits of the floor size value.
///
/// Reads `value` from the structured object first. Anything else (a text
/// rendering of the object, an unexpected shape) goes through the
/// `'value': '<x>'` pattern. Empty when nothing matches.
pub fn floor_size_digits(floor_size: &Value) -> String {
    if let Some(value) = floor_size.get("value") {
        match value {
            Value::String(s) => return digits(s),
            Value::Number(n) => {
                if let Some(whole) = n.as_u64().or_else(|| n.as_f64().map(|f| f.trunc() as u64)) {
                    return whole.to_string();
                }
            }
            _ => {}
        }
    }

    let text = match floor_size {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    FLOOR_SIZE_VALUE
        .captures(&text)
        .and_then(|caps| caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3)))
        .map(|m| digits(m.as_str()))
        .unwrap_or_default()
}

fn digits(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}
