//! OCR input contract: tokens and pages.
//!
//! Token shape is validated here, once, so the layout and resolver code can
//! work with fixed-shape values.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::LayoutError;
use crate::layout::geometry::{quad_from_points, Point, Quad, Rect};

/// One OCR-recognized text span.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    /// Recognized text.
    pub text: String,
    /// Bounding quadrilateral as produced by the OCR engine.
    pub quad: Quad,
    /// Recognition confidence (0.0 - 1.0).
    pub confidence: f32,
    /// Axis-aligned rectangle derived from `quad`.
    pub rect: Rect,
}

impl Token {
    /// Create a token, deriving its rectangle. Confidence is clamped to [0, 1].
    pub fn new(text: impl Into<String>, quad: Quad, confidence: f32) -> Self {
        Self {
            text: text.into(),
            rect: Rect::from_quad(&quad),
            quad,
            confidence: if confidence.is_finite() {
                confidence.clamp(0.0, 1.0)
            } else {
                0.0
            },
        }
    }

    /// Create a token from an axis-aligned box `[x1, y1, x2, y2]`.
    pub fn axis_aligned(text: impl Into<String>, bbox: [f32; 4], confidence: f32) -> Self {
        let [x1, y1, x2, y2] = bbox;
        Self::new(text, [[x1, y1], [x2, y1], [x2, y2], [x1, y2]], confidence)
    }
}

/// A token as it arrives from the OCR collaborator, before validation.
///
/// Both the object form and PaddleOCR's `[box, [text, score]]` tuple form
/// are accepted.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawToken {
    Object {
        text: String,
        #[serde(alias = "quad", alias = "box")]
        bbox: Vec<Point>,
        #[serde(default = "default_confidence", alias = "score")]
        confidence: f32,
    },
    Paddle(Vec<Point>, (String, f32)),
}

fn default_confidence() -> f32 {
    1.0
}

impl RawToken {
    fn into_parts(self) -> (String, Vec<Point>, f32) {
        match self {
            RawToken::Object {
                text,
                bbox,
                confidence,
            } => (text, bbox, confidence),
            RawToken::Paddle(bbox, (text, confidence)) => (text, bbox, confidence),
        }
    }
}

/// Unvalidated page payload.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPage {
    pub width: f32,
    pub height: f32,
    pub tokens: Vec<RawToken>,
}

/// A single document page: validated tokens plus pixel dimensions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawPage")]
pub struct OcrPage {
    /// Page width in pixels.
    pub width: f32,
    /// Page height in pixels.
    pub height: f32,
    /// Recognized tokens in OCR output order.
    pub tokens: Vec<Token>,
}

impl OcrPage {
    /// Build a page, rejecting a bad page size or any non-finite token corner.
    pub fn new(width: f32, height: f32, tokens: Vec<Token>) -> Result<Self, LayoutError> {
        let page = Self {
            width,
            height,
            tokens,
        };
        page.validate()?;
        Ok(page)
    }

    /// Check the page contract: positive finite size and finite corners on
    /// every token. Fields are public, so the pipeline re-runs this before
    /// analysis.
    pub fn validate(&self) -> Result<(), LayoutError> {
        let (width, height) = (self.width, self.height);
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(LayoutError::InvalidPageSize { width, height });
        }

        for (index, token) in self.tokens.iter().enumerate() {
            quad_from_points(&token.quad, index)?;
        }

        Ok(())
    }

    /// Load a page from a JSON file.
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

impl TryFrom<RawPage> for OcrPage {
    type Error = LayoutError;

    fn try_from(raw: RawPage) -> Result<Self, Self::Error> {
        let mut tokens = Vec::with_capacity(raw.tokens.len());

        for (index, raw_token) in raw.tokens.into_iter().enumerate() {
            let (text, points, confidence) = raw_token.into_parts();
            let quad = quad_from_points(&points, index)?;

            if text.trim().is_empty() {
                debug!("Dropping empty token {}", index);
                continue;
            }

            tokens.push(Token::new(text, quad, confidence));
        }

        OcrPage::new(raw.width, raw.height, tokens)
    }
}
