//! Parsing of vision-language model responses.
//!
//! The VLM itself is an external collaborator that reads the page image and
//! answers in free text. This module recovers the JSON object from that
//! text and normalizes its values.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

lazy_static! {
    static ref FENCED_JSON: Regex = Regex::new(r"(?i)```json\s*([\s\S]*?)\s*```").unwrap();
    static ref FIRST_OBJECT: Regex = Regex::new(r"\{[\s\S]*?\}").unwrap();
}

/// Marker preceding the model's answer in chat-style decodes.
const ASSISTANT_MARKER: &str = "assistant";

/// Fields returned by the VLM.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VlmFields {
    #[serde(default, deserialize_with = "lenient_text")]
    pub dealer_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub model_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub horse_power: Option<f64>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub asset_cost: Option<u64>,
}

impl VlmFields {
    /// Number of fields with a value.
    pub fn filled(&self) -> usize {
        [
            self.dealer_name.is_some(),
            self.model_name.is_some(),
            self.horse_power.is_some(),
            self.asset_cost.is_some(),
        ]
        .iter()
        .filter(|f| **f)
        .count()
    }
}

/// Locate the JSON object in a raw VLM response.
///
/// Only text after the first "assistant" marker is considered (the whole
/// text when there is none). A fenced ```json block wins over a bare
/// `{...}` object.
pub fn extract_json_text(raw: &str) -> Option<String> {
    if raw.is_empty() {
        return None;
    }

    let text = raw
        .split_once(ASSISTANT_MARKER)
        .map_or(raw, |(_, answer)| answer);

    if let Some(caps) = FENCED_JSON.captures(text) {
        return Some(caps[1].trim().to_string());
    }

    FIRST_OBJECT.find(text).map(|m| m.as_str().trim().to_string())
}

/// Extract and parse the VLM fields. `None` when no parsable object exists.
pub fn parse_vlm_fields(raw: &str) -> Option<VlmFields> {
    let json = extract_json_text(raw)?;

    match serde_json::from_str(&json) {
        Ok(fields) => Some(fields),
        Err(e) => {
            debug!("VLM response is not valid JSON: {}", e);
            None
        }
    }
}

fn lenient_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(match value {
        Some(Value::String(s)) => {
            let s = s.trim();
            (!s.is_empty() && !s.eq_ignore_ascii_case("null")).then(|| s.to_string())
        }
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(value.as_ref().and_then(number_from_value))
}

fn lenient_amount<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(value
        .as_ref()
        .and_then(number_from_value)
        .filter(|v| *v >= 0.0)
        .map(|v| v.round() as u64))
}

/// Numbers pass through; strings like "Rs. 7,50,000/-" or "47.5 HP" keep
/// the digits from the first digit on.
fn number_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let start = s.find(|c: char| c.is_ascii_digit())?;
            let digits: String = s[start..]
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.')
                .collect();
            digits.trim_end_matches('.').parse().ok()
        }
        _ => None,
    }
}
