//! Engine horsepower resolution (engine HP, not PTO HP).
//!
//! Geometry first: a value sitting under the "HP" column header scores
//! highest, anything near the "PTO" column is penalized. Lexical anchors
//! ("hp" next to the number, engine words) refine the score.

use tracing::trace;

use super::patterns::HP_NUMBER;
use super::{Candidate, FieldResolver, decide};
use crate::layout::{Line, PageLayout};
use crate::models::config::HorsepowerConfig;
use crate::models::result::{Reason, Resolution, round3};

const PTO_KEYWORDS: &[&str] = &["pto", "pto hp", "pto power", "power take off"];
const ENGINE_KEYWORDS: &[&str] = &["engine", "tractor", "diesel"];

const TABLE_BONUS: f32 = 0.25;
const COLUMN_WEIGHT: f32 = 0.35;
const COLUMN_FALLOFF_PX: f32 = 300.0;
const PTO_COLUMN_PENALTY: f32 = 0.45;
const PTO_COLUMN_RADIUS_PX: f32 = 60.0;
const HP_NEAR_BONUS: f32 = 0.30;
const HP_ANYWHERE_BONUS: f32 = 0.10;
const HP_NEAR_CHARS: usize = 12;
const ENGINE_BONUS: f32 = 0.15;
const PTO_KEYWORD_PENALTY: f32 = 0.35;
const VERTICAL_BONUS: f32 = 0.10;

/// X positions of the HP and PTO column headers, if any.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HpColumns {
    pub hp_x: Option<f32>,
    pub pto_x: Option<f32>,
}

impl HpColumns {
    /// Scan every token. A token reading exactly "hp" sets the HP column,
    /// otherwise a token containing "pto" sets the PTO column. The last
    /// occurrence wins.
    pub fn detect(layout: &PageLayout) -> Self {
        let mut columns = Self::default();

        for token in layout.tokens() {
            let text = token.text.to_lowercase();
            if text.trim() == "hp" {
                columns.hp_x = Some(token.rect.x_center);
            } else if text.contains("pto") {
                columns.pto_x = Some(token.rect.x_center);
            }
        }

        columns
    }
}

/// Horsepower resolver.
pub struct HorsepowerResolver {
    config: HorsepowerConfig,
}

impl HorsepowerResolver {
    pub fn new(config: HorsepowerConfig) -> Self {
        Self { config }
    }

    /// Plausible horsepower values in a lowercased line, with their
    /// character offsets.
    ///
    /// When the line holds a "/" and two or more values, only the first is
    /// kept ("45 HP / 40 PTO HP" lists engine HP first).
    pub fn extract_values(&self, text: &str) -> Vec<(u32, usize)> {
        let mut values: Vec<(u32, usize)> = HP_NUMBER
            .find_iter(text)
            .filter_map(|m| {
                let value: f32 = m.as_str().parse().ok()?;
                (self.config.min_hp..=self.config.max_hp)
                    .contains(&value)
                    .then(|| (value.round_ties_even() as u32, char_offset(text, m.start())))
            })
            .collect();

        if text.contains('/') && values.len() >= 2 {
            values.truncate(1);
        }

        values
    }

    fn score(
        &self,
        offset: usize,
        text: &str,
        line: &Line,
        table_like: bool,
        columns: HpColumns,
        page_height: f32,
    ) -> f32 {
        let mut score = 0.0;

        if table_like {
            score += TABLE_BONUS;
        }

        let line_x = line.x_center();

        if let Some(hp_x) = columns.hp_x {
            let dist = (line_x - hp_x).abs();
            score += (1.0 - dist / COLUMN_FALLOFF_PX).max(0.0) * COLUMN_WEIGHT;
        }

        if let Some(pto_x) = columns.pto_x {
            if (line_x - pto_x).abs() < PTO_COLUMN_RADIUS_PX {
                score -= PTO_COLUMN_PENALTY;
            }
        }

        if let Some(idx) = text.find("hp") {
            if char_offset(text, idx).abs_diff(offset) <= HP_NEAR_CHARS {
                score += HP_NEAR_BONUS;
            } else {
                score += HP_ANYWHERE_BONUS;
            }
        }

        if ENGINE_KEYWORDS.iter().any(|k| text.contains(k)) {
            score += ENGINE_BONUS;
        }

        if PTO_KEYWORDS.iter().any(|k| text.contains(k)) {
            score -= PTO_KEYWORD_PENALTY;
        }

        let vertical_ratio = line.y_center() / page_height;
        if (0.25..=0.75).contains(&vertical_ratio) {
            score += VERTICAL_BONUS;
        }

        round3(score).clamp(0.0, 1.0)
    }
}

impl Default for HorsepowerResolver {
    fn default() -> Self {
        Self::new(HorsepowerConfig::default())
    }
}

impl FieldResolver for HorsepowerResolver {
    type Output = u32;

    const FIELD: &'static str = "horse_power";

    fn candidates(&self, layout: &PageLayout) -> Vec<Candidate<u32>> {
        let columns = HpColumns::detect(layout);
        trace!("HP columns: {:?}", columns);

        let mut candidates = Vec::new();

        for (block, line_id, line) in layout.lines() {
            let text = line.text().to_lowercase();

            for (value, offset) in self.extract_values(&text) {
                let score = self.score(
                    offset,
                    &text,
                    line,
                    block.is_table_like(),
                    columns,
                    layout.height,
                );
                candidates.push(
                    Candidate::new(value, score, text.clone(), line.bbox()).at(block.id, line_id),
                );
            }
        }

        candidates
    }

    fn resolve(&self, layout: &PageLayout) -> Resolution<u32> {
        decide(
            self.candidates(layout),
            self.config.score_threshold,
            Reason::ColumnAlignedMatch,
        )
    }
}

fn char_offset(text: &str, byte_idx: usize) -> usize {
    text[..byte_idx].chars().count()
}
