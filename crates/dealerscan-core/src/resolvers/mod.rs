//! Field resolvers: score candidate spans over the block hierarchy and pick
//! the single best answer, or abstain.

pub mod dealer;
pub mod horsepower;
pub mod model;
pub mod normalize;
pub mod patterns;

pub use dealer::{DealerRegistry, DealerResolver};
pub use horsepower::HorsepowerResolver;
pub use model::ModelNameResolver;

use crate::layout::{PageLayout, Rect};
use crate::models::result::{Reason, Resolution};

/// Trait for field resolvers.
pub trait FieldResolver {
    /// The type of value this resolver produces.
    type Output;

    /// Key under which the field is reported.
    const FIELD: &'static str;

    /// Every scored candidate, in page order.
    fn candidates(&self, layout: &PageLayout) -> Vec<Candidate<Self::Output>>;

    /// Pick the best candidate or abstain.
    fn resolve(&self, layout: &PageLayout) -> Resolution<Self::Output>;
}

/// A provisional field value with its score and provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate<T> {
    /// Candidate value.
    pub value: T,
    /// Score in [0, 1].
    pub score: f32,
    /// Block the candidate came from.
    pub block_id: usize,
    /// Line index within the block.
    pub line_id: usize,
    /// Bounding box of the source line.
    pub bbox: Rect,
    /// Source line text.
    pub source_text: String,
}

impl<T> Candidate<T> {
    pub fn new(value: T, score: f32, source_text: impl Into<String>, bbox: Rect) -> Self {
        Self {
            value,
            score,
            block_id: 0,
            line_id: 0,
            bbox,
            source_text: source_text.into(),
        }
    }

    pub fn at(mut self, block_id: usize, line_id: usize) -> Self {
        self.block_id = block_id;
        self.line_id = line_id;
        self
    }

    /// Accept if the score clears `threshold`, otherwise report low confidence.
    pub fn into_resolution(self, threshold: f32, reason: Reason) -> Resolution<T> {
        if self.score >= threshold {
            Resolution::accepted(self.value, self.score, reason)
        } else {
            Resolution::low_confidence(self.score)
        }
    }
}

/// Highest-scoring candidate. Ties go to the earliest one.
pub fn best_candidate<T>(candidates: Vec<Candidate<T>>) -> Option<Candidate<T>> {
    candidates.into_iter().reduce(|best, c| if c.score > best.score { c } else { best })
}

/// Standard decision: best candidate against a threshold, `no_candidates`
/// when the list is empty.
pub fn decide<T>(candidates: Vec<Candidate<T>>, threshold: f32, reason: Reason) -> Resolution<T> {
    match best_candidate(candidates) {
        Some(best) => best.into_resolution(threshold, reason),
        None => Resolution::no_candidates(),
    }
}
