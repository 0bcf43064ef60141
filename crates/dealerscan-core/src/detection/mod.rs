//! Stamp and signature presence.
//!
//! The visual detector is an external collaborator behind [`VisualDetector`].
//! Its output boxes are matched here, optionally against ground-truth
//! regions, with Intersection-over-Union.

pub mod inspector;
pub mod matcher;
pub mod yolo;

pub use inspector::{ArtifactInspector, ArtifactReport, GroundTruth};
pub use matcher::{ArtifactPresence, DetectionMatcher};
pub use yolo::YoloDetector;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Axis-aligned box `(x1, y1, x2, y2)`. Serialized as a 4-element array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct BBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Convert a center-form box `{x, y, width, height}`.
    pub fn from_center(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x1: x - width / 2.0,
            y1: y - height / 2.0,
            x2: x + width / 2.0,
            y2: y + height / 2.0,
        }
    }

    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).max(0.0)
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Intersection over union. 0 for disjoint or degenerate boxes.
    pub fn iou(&self, other: &BBox) -> f32 {
        let inter_w = (self.x2.min(other.x2) - self.x1.max(other.x1)).max(0.0);
        let inter_h = (self.y2.min(other.y2) - self.y1.max(other.y1)).max(0.0);
        let inter = inter_w * inter_h;
        let union = self.area() + other.area() - inter;

        if union <= 0.0 { 0.0 } else { inter / union }
    }

    /// Scale x and y coordinates independently.
    pub fn scale(&self, sx: f32, sy: f32) -> Self {
        Self::new(self.x1 * sx, self.y1 * sy, self.x2 * sx, self.y2 * sy)
    }

    /// Clip to `[0, width] x [0, height]`.
    pub fn clamp_to(&self, width: f32, height: f32) -> Self {
        Self::new(
            self.x1.clamp(0.0, width),
            self.y1.clamp(0.0, height),
            self.x2.clamp(0.0, width),
            self.y2.clamp(0.0, height),
        )
    }
}

impl From<[f32; 4]> for BBox {
    fn from([x1, y1, x2, y2]: [f32; 4]) -> Self {
        Self::new(x1, y1, x2, y2)
    }
}

impl From<BBox> for [f32; 4] {
    fn from(b: BBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

/// One detector output box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionBox {
    pub class_id: u32,
    pub confidence: f32,
    pub bbox: BBox,
}

/// Artifact classes of the signature/stamp detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactClass {
    Signature,
    Stamp,
}

impl ArtifactClass {
    pub const ALL: [ArtifactClass; 2] = [ArtifactClass::Signature, ArtifactClass::Stamp];

    /// Detector class id.
    pub fn class_id(&self) -> u32 {
        match self {
            ArtifactClass::Signature => 0,
            ArtifactClass::Stamp => 1,
        }
    }

    pub fn from_class_id(id: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.class_id() == id)
    }
}

/// Trait for visual detectors locating stamps and signatures.
pub trait VisualDetector: Send + Sync {
    /// Detect artifacts; boxes are in image pixel coordinates.
    fn detect(&self, image: &DynamicImage) -> Result<Vec<DetectionBox>>;
}
