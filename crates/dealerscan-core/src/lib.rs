//! Core library for tractor quotation field extraction.
//!
//! This crate provides:
//! - OCR token ingestion and validation
//! - Layout segmentation (tokens -> lines -> blocks)
//! - Heuristic field resolvers for dealer name, model name and horsepower
//! - Stamp/signature presence from a YOLO detector, matched by IoU
//! - Parsing of vision-language model responses

pub mod detection;
pub mod error;
pub mod layout;
pub mod models;
pub mod pipeline;
pub mod resolvers;
pub mod vlm;

pub use detection::{
    ArtifactClass, ArtifactInspector, ArtifactPresence, ArtifactReport, BBox, DetectionBox,
    DetectionMatcher, GroundTruth, VisualDetector, YoloDetector,
};
pub use error::{DetectionError, LayoutError, Result, ScanError};
pub use layout::{Block, Line, PageLayout, Rect};
pub use models::config::{DealerStrategy, ScanConfig};
pub use models::document::{OcrPage, Token};
pub use models::result::{Reason, Resolution};
pub use pipeline::{ExtractionReport, LayoutSummary, QuotationExtractor};
pub use resolvers::{
    Candidate, DealerRegistry, DealerResolver, FieldResolver, HorsepowerResolver,
    ModelNameResolver,
};
pub use vlm::{VlmFields, extract_json_text, parse_vlm_fields};

/// Re-export inference types.
pub use dealerscan_inference::{InferenceBackend, Tensor};

#[cfg(feature = "native")]
pub use dealerscan_inference::OrtBackend;
