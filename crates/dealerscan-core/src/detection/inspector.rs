//! Stamp/signature inspection with graceful degradation.
//!
//! An unavailable or failing detector never fails the document: it counts
//! as zero detections, reported with a warning.

use std::path::Path;

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{ArtifactClass, ArtifactPresence, BBox, DetectionBox, DetectionMatcher, VisualDetector};
use crate::error::DetectionError;
use crate::models::config::DetectionConfig;

/// Expected artifact regions, for evaluation runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroundTruth {
    #[serde(default)]
    pub signature: Option<BBox>,
    #[serde(default)]
    pub stamp: Option<BBox>,
}

impl GroundTruth {
    /// Load from JSON: `{"stamp": [x1, y1, x2, y2], "signature": [...]}`.
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            DetectionError::GroundTruth(format!("{}: {}", path.display(), e)).into()
        })
    }

    pub fn get(&self, class: ArtifactClass) -> Option<&BBox> {
        match class {
            ArtifactClass::Signature => self.signature.as_ref(),
            ArtifactClass::Stamp => self.stamp.as_ref(),
        }
    }
}

/// Presence of every artifact class on one page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtifactReport {
    pub signature: ArtifactPresence,
    pub stamp: ArtifactPresence,
}

impl ArtifactReport {
    pub fn absent() -> Self {
        Self {
            signature: ArtifactPresence::absent(),
            stamp: ArtifactPresence::absent(),
        }
    }
}

/// Runs the visual detector and decides presence per class.
pub struct ArtifactInspector {
    detector: Option<Box<dyn VisualDetector>>,
    matcher: DetectionMatcher,
}

impl ArtifactInspector {
    pub fn new(detector: Box<dyn VisualDetector>, matcher: DetectionMatcher) -> Self {
        Self {
            detector: Some(detector),
            matcher,
        }
    }

    /// An inspector with no detector: every class is reported absent.
    pub fn unavailable(matcher: DetectionMatcher) -> Self {
        Self {
            detector: None,
            matcher,
        }
    }

    /// Load the YOLO model from the configured path. A missing or broken
    /// model yields an inspector without a detector.
    #[cfg(feature = "native")]
    pub fn from_config(config: &DetectionConfig) -> Self {
        let matcher = DetectionMatcher::new(config.match_iou_threshold);

        match super::YoloDetector::from_config(config) {
            Ok(detector) => {
                tracing::info!("Loaded artifact detector from {}", config.model_path.display());
                Self::new(Box::new(detector), matcher)
            }
            Err(e) => {
                warn!(
                    "Artifact detector unavailable ({}); stamp/signature detection skipped",
                    e
                );
                Self::unavailable(matcher)
            }
        }
    }

    #[cfg(not(feature = "native"))]
    pub fn from_config(config: &DetectionConfig) -> Self {
        warn!("Built without a native inference backend; stamp/signature detection skipped");
        Self::unavailable(DetectionMatcher::new(config.match_iou_threshold))
    }

    pub fn has_detector(&self) -> bool {
        self.detector.is_some()
    }

    /// Raw detections; empty when the detector is missing or fails.
    pub fn detections(&self, image: &DynamicImage) -> Vec<DetectionBox> {
        let Some(detector) = &self.detector else {
            return Vec::new();
        };

        match detector.detect(image) {
            Ok(detections) => detections,
            Err(e) => {
                warn!("Artifact detection failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Decide presence for a page.
    pub fn inspect(&self, image: &DynamicImage, ground_truth: Option<&GroundTruth>) -> ArtifactReport {
        let detections = self.detections(image);
        self.report(&detections, ground_truth)
    }

    /// Decide presence from already-computed detections.
    pub fn report(
        &self,
        detections: &[DetectionBox],
        ground_truth: Option<&GroundTruth>,
    ) -> ArtifactReport {
        let presence = |class: ArtifactClass| {
            self.matcher.match_class(
                detections,
                class.class_id(),
                ground_truth.and_then(|gt| gt.get(class)),
            )
        };

        ArtifactReport {
            signature: presence(ArtifactClass::Signature),
            stamp: presence(ArtifactClass::Stamp),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScanError;
    use pretty_assertions::assert_eq;

    struct FixedDetector(Vec<DetectionBox>);

    impl VisualDetector for FixedDetector {
        fn detect(&self, _image: &DynamicImage) -> crate::Result<Vec<DetectionBox>> {
            Ok(self.0.clone())
        }
    }

    struct BrokenDetector;

    impl VisualDetector for BrokenDetector {
        fn detect(&self, _image: &DynamicImage) -> crate::Result<Vec<DetectionBox>> {
            Err(ScanError::Detection(DetectionError::UnexpectedOutput(
                "boom".to_string(),
            )))
        }
    }

    fn image() -> DynamicImage {
        DynamicImage::new_rgb8(100, 100)
    }

    #[test]
    fn test_inspect_reports_both_classes() {
        let inspector = ArtifactInspector::new(
            Box::new(FixedDetector(vec![DetectionBox {
                class_id: 1,
                confidence: 0.8,
                bbox: BBox::new(10.0, 10.0, 40.0, 40.0),
            }])),
            DetectionMatcher::default(),
        );

        let report = inspector.inspect(&image(), None);
        assert!(report.stamp.present);
        assert!(!report.signature.present);
    }

    #[test]
    fn test_missing_detector_reports_absent() {
        let inspector = ArtifactInspector::unavailable(DetectionMatcher::default());
        assert!(!inspector.has_detector());
        assert_eq!(inspector.inspect(&image(), None), ArtifactReport::absent());
    }

    #[test]
    fn test_failing_detector_reports_absent() {
        let inspector = ArtifactInspector::new(Box::new(BrokenDetector), DetectionMatcher::default());
        assert_eq!(inspector.inspect(&image(), None), ArtifactReport::absent());
    }

    #[cfg(feature = "native")]
    #[test]
    fn test_missing_model_file_degrades() {
        let config = DetectionConfig {
            model_path: "does/not/exist.onnx".into(),
            ..DetectionConfig::default()
        };
        let inspector = ArtifactInspector::from_config(&config);
        assert!(!inspector.has_detector());
    }

    #[test]
    fn test_ground_truth_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gt.json");
        std::fs::write(&path, r#"{"stamp": [600, 850, 760, 980]}"#).unwrap();

        let gt = GroundTruth::from_file(&path).unwrap();
        assert_eq!(gt.stamp, Some(BBox::new(600.0, 850.0, 760.0, 980.0)));
        assert_eq!(gt.signature, None);

        std::fs::write(&path, r#"{"stamp": [1, 2]}"#).unwrap();
        assert!(GroundTruth::from_file(&path).is_err());
    }
}
