//! Shape check applied to every payload before it can reach the cache,
//! whether it came from the upstream provider or a manual override.

use serde::Deserialize;
use serde_json::Value;

use crate::error::ValidationError;
use crate::models::Match;

/// Validate a raw JSON document and decode it into matches.
///
/// All-or-nothing: a single bad element rejects the whole batch. An empty
/// array is valid here; callers decide what emptiness means.
///
/// The shape check is the only gate. Decoding types just the four key
/// fields and keeps the rest as raw JSON, so it accepts every element
/// that passed the check.
pub fn validate_matches(raw: &Value) -> Result<Vec<Match>, ValidationError> {
    let items = raw.as_array().ok_or(ValidationError::NotAnArray)?;

    for (index, item) in items.iter().enumerate() {
        check_element(item).map_err(|reason| ValidationError::BadElement {
            index,
            reason: reason.to_string(),
        })?;
    }

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            Match::deserialize(item).map_err(|e| ValidationError::Decode {
                index,
                message: e.to_string(),
            })
        })
        .collect()
}

fn check_element(item: &Value) -> Result<(), &'static str> {
    if !item.is_object() {
        return Err("not an object");
    }
    if !item["matchId"].is_string() {
        return Err("missing string matchId");
    }
    if !item["status"].is_string() {
        return Err("missing string status");
    }
    if !item["home"].is_object() || !item["home"]["id"].is_string() {
        return Err("home team missing string id");
    }
    if !item["away"].is_object() || !item["away"]["id"].is_string() {
        return Err("away team missing string id");
    }
    Ok(())
}
