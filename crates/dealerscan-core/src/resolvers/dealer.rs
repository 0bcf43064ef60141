//! Dealer name resolution.
//!
//! One resolver, two scoring strategies:
//! - registry: fuzzy-match header lines against known dealer names
//! - heuristic: weight position, business vocabulary, capitalization and OCR
//!   confidence for every line on the page

use std::path::Path;

use tracing::{debug, warn};

use super::normalize::{normalize_name, token_sort_similarity};
use super::patterns::BUSINESS_KEYWORD;
use super::{Candidate, FieldResolver, best_candidate, decide};
use crate::layout::{Line, PageLayout};
use crate::models::config::{DealerConfig, DealerStrategy};
use crate::models::result::{Reason, Resolution};

/// Lines containing any of these (lowercased) are never dealer names.
const HEURISTIC_EXCLUSIONS: &[&str] = &[
    "gst", "phone", "mob", "email", "date", "quotation", "invoice", "bank",
];

/// Normalized header lines containing any of these are not registry candidates.
const REGISTRY_REJECTS: &[&str] = &["GST", "EMAIL", "MOB", "DATE", "PIN", "PHONE", "FAX"];

const POSITION_WEIGHT: f32 = 0.35;
const KEYWORD_WEIGHT: f32 = 0.15;
const KEYWORD_CAP: f32 = 0.30;
const CAPITALIZATION_WEIGHT: f32 = 0.15;
const CONFIDENCE_WEIGHT: f32 = 0.20;

/// Known dealer names.
#[derive(Debug, Clone, Default)]
pub struct DealerRegistry {
    names: Vec<String>,
}

impl DealerRegistry {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Load a registry from a JSON array of names.
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let names: Vec<String> = serde_json::from_str(&content)?;
        debug!("Loaded {} dealers from {}", names.len(), path.display());
        Ok(Self::new(names))
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Dealer name resolver.
pub struct DealerResolver {
    config: DealerConfig,
    registry: Option<DealerRegistry>,
}

impl DealerResolver {
    pub fn new(config: DealerConfig) -> Self {
        Self {
            config,
            registry: None,
        }
    }

    /// Attach the registry used by the registry strategies.
    pub fn with_registry(mut self, registry: DealerRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Override the configured strategy.
    pub fn with_strategy(mut self, strategy: DealerStrategy) -> Self {
        self.config.strategy = strategy;
        self
    }

    /// Score every eligible line with the weighted heuristic.
    pub fn heuristic_candidates(&self, layout: &PageLayout) -> Vec<Candidate<String>> {
        layout
            .lines()
            .filter_map(|(block, line_id, line)| {
                let text = line.text();
                if !is_heuristic_candidate(&text) {
                    return None;
                }
                let score = heuristic_score(line, &text, layout.height);
                Some(
                    Candidate::new(text.clone(), score, text, line.bbox())
                        .at(block.id, line_id),
                )
            })
            .collect()
    }

    /// Pair every eligible header line with every registry entry.
    pub fn registry_candidates(
        &self,
        layout: &PageLayout,
        registry: &DealerRegistry,
    ) -> Vec<Candidate<String>> {
        let fold = self.config.fold_confusable_digits;
        let known: Vec<(&String, String)> = registry
            .names()
            .iter()
            .map(|name| (name, normalize_name(name, fold)))
            .collect();

        let mut candidates = Vec::new();

        for block in layout.blocks.iter().take(self.config.header_blocks) {
            for (line_id, line) in block.lines().iter().enumerate() {
                let text = line.text();
                let normalized = normalize_name(&text, fold);
                if !is_registry_candidate(&normalized) {
                    continue;
                }

                for (name, known_normalized) in &known {
                    let score = token_sort_similarity(&normalized, known_normalized);
                    candidates.push(
                        Candidate::new((*name).clone(), score, text.clone(), line.bbox())
                            .at(block.id, line_id),
                    );
                }
            }
        }

        candidates
    }

    /// Heuristic strategy only.
    pub fn resolve_heuristic(&self, layout: &PageLayout) -> Resolution<String> {
        decide(
            self.heuristic_candidates(layout),
            self.config.heuristic_threshold,
            Reason::HeuristicMatch,
        )
    }

    /// Registry strategy only. An accepted match reports `heuristic_match`
    /// with the matched header line as `original_text`.
    pub fn resolve_registry(
        &self,
        layout: &PageLayout,
        registry: &DealerRegistry,
    ) -> Resolution<String> {
        match best_candidate(self.registry_candidates(layout, registry)) {
            Some(best) => {
                let source = best.source_text.clone();
                let resolution =
                    best.into_resolution(self.config.registry_threshold, Reason::HeuristicMatch);
                if resolution.is_resolved() {
                    resolution.with_original_text(source)
                } else {
                    resolution
                }
            }
            None => Resolution::no_candidates(),
        }
    }
}

impl FieldResolver for DealerResolver {
    type Output = String;

    const FIELD: &'static str = "dealer_name";

    fn candidates(&self, layout: &PageLayout) -> Vec<Candidate<String>> {
        match (&self.registry, self.config.strategy) {
            (Some(registry), DealerStrategy::Registry) => {
                self.registry_candidates(layout, registry)
            }
            (Some(registry), DealerStrategy::RegistryWithFallback) => {
                let mut all = self.registry_candidates(layout, registry);
                all.extend(self.heuristic_candidates(layout));
                all
            }
            _ => self.heuristic_candidates(layout),
        }
    }

    fn resolve(&self, layout: &PageLayout) -> Resolution<String> {
        let registry = match (&self.registry, self.config.strategy) {
            (_, DealerStrategy::Heuristic) => return self.resolve_heuristic(layout),
            (Some(registry), _) => registry,
            (None, strategy) => {
                warn!("Dealer strategy {:?} needs a registry; using heuristics", strategy);
                return self.resolve_heuristic(layout);
            }
        };

        let resolution = self.resolve_registry(layout, registry);

        if self.config.strategy == DealerStrategy::RegistryWithFallback && !resolution.is_resolved()
        {
            debug!(
                "No registry match (best {:.2}); falling back to heuristics",
                resolution.confidence
            );
            return self.resolve_heuristic(layout);
        }

        resolution
    }
}

fn is_heuristic_candidate(text: &str) -> bool {
    if text.split_whitespace().count() < 2 {
        return false;
    }
    let lower = text.to_lowercase();
    !HEURISTIC_EXCLUSIONS.iter().any(|k| lower.contains(k))
}

fn is_registry_candidate(normalized: &str) -> bool {
    normalized.chars().count() >= 5
        && !REGISTRY_REJECTS.iter().any(|k| normalized.contains(k))
        && normalized.chars().filter(|c| c.is_ascii_digit()).count() <= 3
}

/// Weighted heuristic score in [0, 1].
fn heuristic_score(line: &Line, text: &str, page_height: f32) -> f32 {
    let vertical_ratio = (line.y_center() / page_height).clamp(0.0, 1.0);
    let position = (1.0 - vertical_ratio) * POSITION_WEIGHT;

    let keyword_hits = BUSINESS_KEYWORD.find_iter(&text.to_lowercase()).count();
    let keywords = (keyword_hits as f32 * KEYWORD_WEIGHT).min(KEYWORD_CAP);

    let capitalization = uppercase_ratio(text) * CAPITALIZATION_WEIGHT;
    let confidence = line.max_confidence() * CONFIDENCE_WEIGHT;

    (position + keywords + capitalization + confidence).clamp(0.0, 1.0)
}

/// Share of alphabetic characters that are uppercase.
fn uppercase_ratio(text: &str) -> f32 {
    let (upper, alpha) = text
        .chars()
        .filter(|c| c.is_alphabetic())
        .fold((0usize, 0usize), |(u, a), c| (u + c.is_uppercase() as usize, a + 1));

    if alpha == 0 {
        0.0
    } else {
        upper as f32 / alpha as f32
    }
}
