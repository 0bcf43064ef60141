//! Per-field resolution results.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Why a resolver returned what it returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    /// Best heuristic candidate cleared the threshold.
    HeuristicMatch,
    /// Best candidate cleared the threshold with column alignment in play.
    ColumnAlignedMatch,
    /// Candidates existed but none scored high enough.
    LowConfidence,
    /// Nothing survived filtering.
    NoCandidates,
}

impl Reason {
    /// Snake-case code used in JSON output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Reason::HeuristicMatch => "heuristic_match",
            Reason::ColumnAlignedMatch => "column_aligned_match",
            Reason::LowConfidence => "low_confidence",
            Reason::NoCandidates => "no_candidates",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of resolving one field. Never an error: abstention is a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution<T> {
    /// Resolved value, `None` on abstention.
    pub value: Option<T>,
    /// Score of the best candidate, rounded to 2 decimals.
    pub confidence: f32,
    /// Reason code.
    pub reason: Reason,
    /// Source line the value was extracted from, for audit.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub original_text: Option<String>,
}

impl<T> Resolution<T> {
    /// An accepted value.
    pub fn accepted(value: T, score: f32, reason: Reason) -> Self {
        Self {
            value: Some(value),
            confidence: round2(score),
            reason,
            original_text: None,
        }
    }

    /// Candidates existed but the best scored below threshold.
    pub fn low_confidence(score: f32) -> Self {
        Self {
            value: None,
            confidence: round2(score),
            reason: Reason::LowConfidence,
            original_text: None,
        }
    }

    /// No candidate survived filtering.
    pub fn no_candidates() -> Self {
        Self {
            value: None,
            confidence: 0.0,
            reason: Reason::NoCandidates,
            original_text: None,
        }
    }

    /// Attach the source line text.
    pub fn with_original_text(mut self, text: impl Into<String>) -> Self {
        self.original_text = Some(text.into());
        self
    }

    /// Whether a value was resolved.
    pub fn is_resolved(&self) -> bool {
        self.value.is_some()
    }

    /// Map the resolved value.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resolution<U> {
        Resolution {
            value: self.value.map(f),
            confidence: self.confidence,
            reason: self.reason,
            original_text: self.original_text,
        }
    }
}

impl<T: Serialize> Resolution<T> {
    /// Render as `{ <field>: value|null, "confidence": .., "reason": .. }`.
    pub fn keyed(&self, field: &str) -> Value {
        let mut obj = json!({
            field: self.value,
            "confidence": self.confidence,
            "reason": self.reason,
        });
        if let (Some(text), Some(map)) = (&self.original_text, obj.as_object_mut()) {
            map.insert("original_text".to_string(), Value::String(text.clone()));
        }
        obj
    }
}

/// Round to two decimals.
pub fn round2(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}

/// Round to three decimals.
pub fn round3(value: f32) -> f32 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_keyed_abstention() {
        let res: Resolution<String> = Resolution::no_candidates();
        assert_eq!(
            res.keyed("dealer_name"),
            json!({"dealer_name": null, "confidence": 0.0, "reason": "no_candidates"})
        );
    }

    #[test]
    fn test_keyed_match_carries_original_text() {
        let res = Resolution::accepted("575 DI".to_string(), 0.8149, Reason::HeuristicMatch)
            .with_original_text("MAHINDRA 575 DI XP PLUS");
        let value = res.keyed("model_name");

        assert_eq!(value["model_name"], "575 DI");
        assert_eq!(value["reason"], "heuristic_match");
        assert_eq!(value["original_text"], "MAHINDRA 575 DI XP PLUS");
    }

    #[test]
    fn test_confidence_rounding() {
        assert_eq!(Resolution::<u32>::low_confidence(0.4449).confidence, 0.44);
        assert_eq!(round3(0.12345), 0.123);
    }
}
