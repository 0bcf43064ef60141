//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for the dealerscan pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Line and block grouping.
    pub layout: LayoutConfig,

    /// Dealer name resolution.
    pub dealer: DealerConfig,

    /// Tractor model name resolution.
    pub model: ModelNameConfig,

    /// Engine horsepower resolution.
    pub horsepower: HorsepowerConfig,

    /// Stamp/signature detection.
    pub detection: DetectionConfig,
}

/// Layout segmentation thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Vertical overlap ratio above which a token joins a line.
    pub line_overlap_ratio: f32,

    /// Center distance (in reference heights) below which a token joins a line.
    pub line_center_tolerance: f32,

    /// Gap (in average line heights) that opens a new block.
    pub block_gap_factor: f32,

    /// Width in pixels of the column buckets used to detect tables.
    pub table_column_width: f32,

    /// Case-insensitive markers that always open a new block.
    pub block_break_keywords: Vec<String>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            line_overlap_ratio: 0.5,
            line_center_tolerance: 0.6,
            block_gap_factor: 1.3,
            table_column_width: 50.0,
            block_break_keywords: [
                "S.N.",
                "Particulars",
                "TRACTOR",
                "Accessories",
                "Total",
                "special Note",
                "Customer Signature",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// How the dealer name is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DealerStrategy {
    /// Score every line with position/keyword/case/confidence heuristics.
    Heuristic,
    /// Fuzzy-match header lines against a registry of known dealers.
    Registry,
    /// Registry first, heuristics when the registry finds nothing.
    RegistryWithFallback,
}

/// Dealer name resolver settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DealerConfig {
    /// Resolution strategy. Registry strategies need `registry_path`.
    pub strategy: DealerStrategy,

    /// JSON file with an array of known dealer names.
    pub registry_path: Option<PathBuf>,

    /// Number of leading blocks searched in registry mode.
    pub header_blocks: usize,

    /// Minimum fuzzy similarity for a registry match.
    pub registry_threshold: f32,

    /// Minimum heuristic score.
    pub heuristic_threshold: f32,

    /// Fold OCR-confusable digits (0 -> O, 1 -> I) inside words that also
    /// contain letters. Purely numeric words are never folded.
    pub fold_confusable_digits: bool,
}

impl Default for DealerConfig {
    fn default() -> Self {
        Self {
            strategy: DealerStrategy::Heuristic,
            registry_path: None,
            header_blocks: 3,
            registry_threshold: 0.90,
            heuristic_threshold: 0.6,
            fold_confusable_digits: true,
        }
    }
}

/// Model name resolver settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelNameConfig {
    /// Minimum score to accept a model name.
    pub score_threshold: f32,
}

impl Default for ModelNameConfig {
    fn default() -> Self {
        Self {
            score_threshold: 0.5,
        }
    }
}

/// Horsepower resolver settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HorsepowerConfig {
    /// Minimum score to accept a horsepower value.
    pub score_threshold: f32,

    /// Smallest plausible engine horsepower.
    pub min_hp: f32,

    /// Largest plausible engine horsepower.
    pub max_hp: f32,
}

impl Default for HorsepowerConfig {
    fn default() -> Self {
        Self {
            score_threshold: 0.55,
            min_hp: 20.0,
            max_hp: 100.0,
        }
    }
}

/// Stamp/signature detector settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// YOLO ONNX model detecting signatures (class 0) and stamps (class 1).
    pub model_path: PathBuf,

    /// Square model input size in pixels.
    pub input_size: u32,

    /// Minimum detection confidence.
    pub confidence_threshold: f32,

    /// IoU above which overlapping same-class detections are suppressed.
    pub nms_threshold: f32,

    /// IoU above which a detection matches a ground-truth box.
    pub match_iou_threshold: f32,

    /// Number of CPU threads for inference.
    pub num_threads: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/signature_stamp.onnx"),
            input_size: 640,
            confidence_threshold: 0.25,
            nms_threshold: 0.45,
            match_iou_threshold: 0.5,
            num_threads: 4,
        }
    }
}

impl ScanConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}
