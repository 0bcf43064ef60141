//! Detection to presence decisions.

use serde::Serialize;

use super::{BBox, DetectionBox};
use crate::models::result::round3;

/// Whether an artifact is present, and where.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtifactPresence {
    pub present: bool,
    pub bbox: Option<BBox>,
    /// Detector confidence, rounded to 3 decimals.
    pub confidence: f32,
}

impl ArtifactPresence {
    pub fn absent() -> Self {
        Self {
            present: false,
            bbox: None,
            confidence: 0.0,
        }
    }

    fn from_detection(det: &DetectionBox) -> Self {
        Self {
            present: true,
            bbox: Some(det.bbox),
            confidence: round3(det.confidence),
        }
    }
}

/// Matches detector output against optional ground-truth regions.
#[derive(Debug, Clone, Copy)]
pub struct DetectionMatcher {
    iou_threshold: f32,
}

impl DetectionMatcher {
    pub fn new(iou_threshold: f32) -> Self {
        Self { iou_threshold }
    }

    /// Highest-confidence detection of `class_id`, if any.
    pub fn best_of_class(&self, detections: &[DetectionBox], class_id: u32) -> ArtifactPresence {
        Self::highest(detections.iter().filter(|d| d.class_id == class_id))
    }

    /// Presence of `class_id`.
    ///
    /// Without ground truth every detection of the class is accepted. With
    /// ground truth a detection is accepted only when its IoU against the
    /// expected box exceeds the threshold.
    pub fn match_class(
        &self,
        detections: &[DetectionBox],
        class_id: u32,
        ground_truth: Option<&BBox>,
    ) -> ArtifactPresence {
        let Some(expected) = ground_truth else {
            return self.best_of_class(detections, class_id);
        };

        Self::highest(
            detections
                .iter()
                .filter(|d| d.class_id == class_id)
                .filter(|d| d.bbox.iou(expected) > self.iou_threshold),
        )
    }

    fn highest<'a>(candidates: impl Iterator<Item = &'a DetectionBox>) -> ArtifactPresence {
        candidates
            .reduce(|best, d| if d.confidence > best.confidence { d } else { best })
            .map(ArtifactPresence::from_detection)
            .unwrap_or_else(ArtifactPresence::absent)
    }
}

impl Default for DetectionMatcher {
    fn default() -> Self {
        Self::new(0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn det(class_id: u32, confidence: f32, bbox: [f32; 4]) -> DetectionBox {
        DetectionBox {
            class_id,
            confidence,
            bbox: bbox.into(),
        }
    }

    fn detections() -> Vec<DetectionBox> {
        vec![
            det(0, 0.61, [100.0, 900.0, 300.0, 960.0]),
            det(1, 0.42, [600.0, 850.0, 760.0, 990.0]),
            det(1, 0.88764, [620.0, 100.0, 780.0, 240.0]),
        ]
    }

    #[test]
    fn test_best_of_class() {
        let matcher = DetectionMatcher::default();
        let stamp = matcher.best_of_class(&detections(), 1);

        assert!(stamp.present);
        assert_eq!(stamp.confidence, 0.888);
        assert_eq!(stamp.bbox, Some(BBox::new(620.0, 100.0, 780.0, 240.0)));
    }

    #[test]
    fn test_missing_class_is_absent() {
        let matcher = DetectionMatcher::default();
        assert_eq!(matcher.best_of_class(&detections(), 5), ArtifactPresence::absent());
        assert_eq!(matcher.best_of_class(&[], 0), ArtifactPresence::absent());
    }

    #[test]
    fn test_ground_truth_filters_by_iou() {
        let matcher = DetectionMatcher::default();
        let expected = BBox::new(600.0, 850.0, 760.0, 980.0);

        // The lower stamp overlaps the expected region; the higher-confidence
        // one at the top of the page does not.
        let stamp = matcher.match_class(&detections(), 1, Some(&expected));
        assert!(stamp.present);
        assert_eq!(stamp.confidence, 0.42);

        let nowhere = BBox::new(0.0, 0.0, 10.0, 10.0);
        assert!(!matcher.match_class(&detections(), 1, Some(&nowhere)).present);
    }
}
