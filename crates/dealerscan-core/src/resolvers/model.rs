//! Tractor model name resolution.

use super::patterns::{
    LEADING_BRAND, MODEL_CORE, MODEL_NOISE, MODEL_ROW_BARE, MODEL_ROW_BRANDED, WHITESPACE,
};
use super::{Candidate, FieldResolver, best_candidate};
use crate::layout::{Line, PageLayout};
use crate::models::config::ModelNameConfig;
use crate::models::result::{Reason, Resolution, round3};

/// Lines containing any of these (lowercased) never carry the model.
const LINE_EXCLUSIONS: &[&str] = &[
    "gst", "invoice", "quotation", "total", "amount", "price", "bank", "signature", "customer",
    "party", "terms",
];

/// Spans containing any of these (uppercased) are rejected outright.
const SPAN_BLACKLIST: &[&str] = &[
    "ADDRESS", "IFSC", "BANK", "DATE", "FOR", "TOTAL", "AMOUNT", "HDFC", "GST",
];

const MIN_LINE_CHARS: usize = 5;

const TABLE_BONUS: f32 = 0.30;
const TABLE_ROW_BONUS: f32 = 0.15;
const DENSITY_WEIGHT: f32 = 0.25;
const CENTERING_WEIGHT: f32 = 0.25;
const CONFIDENCE_CAP: f32 = 0.85;
const CONFIDENCE_WEIGHT: f32 = 0.20;

/// Model name resolver.
pub struct ModelNameResolver {
    config: ModelNameConfig,
}

impl ModelNameResolver {
    pub fn new(config: ModelNameConfig) -> Self {
        Self { config }
    }

    /// Weighted score in [0, 1]. The centering term uses the mean y-center of
    /// all tokens in the line, not the y-center of its first token.
    fn score(&self, core: &str, raw: &str, line: &Line, table_like: bool, page_height: f32) -> f32 {
        let mut score = 0.0;

        if table_like {
            score += TABLE_BONUS;
        }

        if extract_table_row(raw).is_some() {
            score += TABLE_ROW_BONUS;
        }

        let alnum = core.chars().filter(|c| c.is_alphanumeric()).count();
        let density = alnum as f32 / core.chars().count().max(1) as f32;
        score += density.min(1.0) * DENSITY_WEIGHT;

        let vertical_ratio = line.y_center() / page_height;
        score += (1.0 - (vertical_ratio - 0.5).abs() * 2.0).max(0.0) * CENTERING_WEIGHT;

        score += line.max_confidence().min(CONFIDENCE_CAP) * CONFIDENCE_WEIGHT;

        round3(score.min(1.0))
    }
}

impl Default for ModelNameResolver {
    fn default() -> Self {
        Self::new(ModelNameConfig::default())
    }
}

impl FieldResolver for ModelNameResolver {
    type Output = String;

    const FIELD: &'static str = "model_name";

    fn candidates(&self, layout: &PageLayout) -> Vec<Candidate<String>> {
        let mut candidates = Vec::new();

        for (block, line_id, line) in layout.lines() {
            let raw = line.text().trim().to_string();
            if raw.chars().count() < MIN_LINE_CHARS || is_excluded_line(&raw) {
                continue;
            }

            let span = if block.is_table_like() {
                extract_table_row(&raw)
            } else {
                Some(raw.clone())
            };

            let Some(core) = span.as_deref().and_then(extract_model_core) else {
                continue;
            };

            let score = self.score(&core, &raw, line, block.is_table_like(), layout.height);
            candidates.push(Candidate::new(core, score, raw, line.bbox()).at(block.id, line_id));
        }

        candidates
    }

    fn resolve(&self, layout: &PageLayout) -> Resolution<String> {
        let Some(best) = best_candidate(self.candidates(layout)) else {
            return Resolution::no_candidates();
        };

        let source = best.source_text.clone();
        let resolution = best.into_resolution(self.config.score_threshold, Reason::HeuristicMatch);

        if resolution.is_resolved() {
            resolution.with_original_text(source)
        } else {
            resolution
        }
    }
}

fn is_excluded_line(text: &str) -> bool {
    let lower = text.to_lowercase();
    LINE_EXCLUSIONS.iter().any(|k| lower.contains(k))
}

/// Pull a model-looking span out of a table row, branded pattern first.
pub fn extract_table_row(text: &str) -> Option<String> {
    let upper = text.to_uppercase();

    [&*MODEL_ROW_BRANDED, &*MODEL_ROW_BARE]
        .iter()
        .find_map(|re| re.find(&upper))
        .map(|m| m.as_str().to_string())
}

/// Reduce a span to its canonical model core, e.g. "575 DI".
///
/// Returns `None` when the span contains blacklisted words, has no digit
/// left after removing configuration noise, or does not match the core
/// pattern.
pub fn extract_model_core(text: &str) -> Option<String> {
    let upper = text.to_uppercase();

    if SPAN_BLACKLIST.iter().any(|b| upper.contains(b)) {
        return None;
    }

    let denoised = MODEL_NOISE.replace_all(&upper, "");
    let collapsed = WHITESPACE.replace_all(denoised.trim(), " ");

    if !collapsed.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let unbranded = LEADING_BRAND.replace(&collapsed, "");

    MODEL_CORE
        .find(&unbranded)
        .map(|m| m.as_str().trim().to_string())
}
