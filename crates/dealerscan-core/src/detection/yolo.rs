//! YOLOv8 ONNX adapter for the signature/stamp detector.

use image::DynamicImage;
use image::imageops::FilterType;
use ndarray::{Array4, Axis, Ix3};
use tracing::debug;

use dealerscan_inference::{InferenceBackend, Tensor};

use super::{BBox, DetectionBox, VisualDetector};
use crate::error::DetectionError;
use crate::models::config::DetectionConfig;
use crate::Result;

const DEFAULT_INPUT_NAME: &str = "images";

/// YOLOv8 detector over any inference backend.
///
/// Input: `[1, 3, size, size]` RGB scaled to [0, 1].
/// Output: `[1, 4 + classes, anchors]` with center-form boxes in input
/// pixel coordinates followed by per-class scores.
pub struct YoloDetector<B: InferenceBackend> {
    backend: B,
    input_size: u32,
    confidence_threshold: f32,
    nms_threshold: f32,
}

impl<B: InferenceBackend> YoloDetector<B> {
    pub fn new(backend: B, config: &DetectionConfig) -> Self {
        Self {
            backend,
            input_size: config.input_size,
            confidence_threshold: config.confidence_threshold,
            nms_threshold: config.nms_threshold,
        }
    }

    /// Resize to the model input and convert to a CHW tensor.
    pub fn preprocess(&self, image: &DynamicImage) -> Result<Tensor> {
        if image.width() == 0 || image.height() == 0 {
            return Err(DetectionError::Preprocessing("empty image".to_string()).into());
        }

        let size = self.input_size;
        let rgb = image
            .resize_exact(size, size, FilterType::Triangle)
            .to_rgb8();

        let mut input = Array4::<f32>::zeros((1, 3, size as usize, size as usize));
        for (x, y, pixel) in rgb.enumerate_pixels() {
            for c in 0..3 {
                input[[0, c, y as usize, x as usize]] = f32::from(pixel[c]) / 255.0;
            }
        }

        Ok(Tensor(input.into_dyn()))
    }

    /// Decode raw output into boxes in original image pixels, then apply NMS.
    pub fn postprocess(
        &self,
        output: &Tensor,
        image_width: u32,
        image_height: u32,
    ) -> Result<Vec<DetectionBox>> {
        let shape = output.shape();
        if shape.len() != 3 || shape[0] != 1 || shape[1] < 5 {
            return Err(DetectionError::UnexpectedOutput(format!(
                "expected [1, 4 + classes, anchors], got {:?}",
                shape
            ))
            .into());
        }

        let output = output
            .0
            .view()
            .into_dimensionality::<Ix3>()
            .map_err(|e| DetectionError::UnexpectedOutput(e.to_string()))?;
        let features = output.index_axis(Axis(0), 0);
        let num_classes = shape[1] - 4;
        let sx = image_width as f32 / self.input_size as f32;
        let sy = image_height as f32 / self.input_size as f32;

        let mut raw = Vec::new();

        for anchor in features.axis_iter(Axis(1)) {
            let (class_id, confidence) = (0..num_classes)
                .map(|c| (c, anchor[4 + c]))
                .fold((0, f32::NEG_INFINITY), |best, cur| {
                    if cur.1 > best.1 { cur } else { best }
                });

            if confidence < self.confidence_threshold {
                continue;
            }

            let bbox = BBox::from_center(anchor[0], anchor[1], anchor[2], anchor[3])
                .scale(sx, sy)
                .clamp_to(image_width as f32, image_height as f32);

            raw.push(DetectionBox {
                class_id: class_id as u32,
                confidence,
                bbox,
            });
        }

        debug!("Raw detections before NMS: {}", raw.len());
        let kept = non_max_suppression(raw, self.nms_threshold);
        debug!("Detections after NMS: {}", kept.len());

        Ok(kept)
    }

    fn input_name(&self) -> &str {
        self.backend
            .input_names()
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_INPUT_NAME)
    }
}

#[cfg(feature = "native")]
impl YoloDetector<dealerscan_inference::OrtBackend> {
    /// Load the ONNX model named in the configuration.
    pub fn from_config(config: &DetectionConfig) -> Result<Self> {
        let backend =
            dealerscan_inference::OrtBackend::from_file(&config.model_path, config.num_threads)?;
        Ok(Self::new(backend, config))
    }
}

impl<B: InferenceBackend> VisualDetector for YoloDetector<B> {
    fn detect(&self, image: &DynamicImage) -> Result<Vec<DetectionBox>> {
        let input = self.preprocess(image)?;
        let outputs = self.backend.run(&[(self.input_name(), input)])?;

        let (_, output) = outputs.into_iter().next().ok_or_else(|| {
            DetectionError::UnexpectedOutput("model produced no outputs".to_string())
        })?;

        self.postprocess(&output, image.width(), image.height())
    }
}

/// Greedy per-class non-maximum suppression, highest confidence first.
pub fn non_max_suppression(mut detections: Vec<DetectionBox>, iou_threshold: f32) -> Vec<DetectionBox> {
    detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut keep: Vec<DetectionBox> = Vec::with_capacity(detections.len());

    for det in detections {
        let suppressed = keep
            .iter()
            .any(|k| k.class_id == det.class_id && k.bbox.iou(&det.bbox) > iou_threshold);
        if !suppressed {
            keep.push(det);
        }
    }

    keep
}

#[cfg(test)]
mod tests {
    use super::*;
    use dealerscan_inference::InferenceError;
    use pretty_assertions::assert_eq;

    /// Backend returning a canned output tensor.
    struct FakeBackend {
        output: Tensor,
        inputs: Vec<String>,
        outputs: Vec<String>,
    }

    impl FakeBackend {
        fn new(output: Tensor) -> Self {
            Self {
                output,
                inputs: vec!["images".to_string()],
                outputs: vec!["output0".to_string()],
            }
        }
    }

    impl InferenceBackend for FakeBackend {
        fn run(
            &self,
            inputs: &[(&str, Tensor)],
        ) -> dealerscan_inference::Result<Vec<(String, Tensor)>> {
            match inputs.first() {
                Some((_, t)) if t.shape() == [1, 3, 64, 64].as_slice() => {
                    Ok(vec![("output0".to_string(), self.output.clone())])
                }
                _ => Err(InferenceError::InvalidInput("bad input".to_string())),
            }
        }

        fn input_names(&self) -> &[String] {
            &self.inputs
        }

        fn output_names(&self) -> &[String] {
            &self.outputs
        }
    }

    fn config() -> DetectionConfig {
        DetectionConfig {
            input_size: 64,
            ..DetectionConfig::default()
        }
    }

    /// Build a `[1, 6, anchors]` output from per-anchor rows
    /// `[cx, cy, w, h, signature, stamp]`.
    fn output(rows: &[[f32; 6]]) -> Tensor {
        let n = rows.len();
        let mut data = vec![0.0; 6 * n];
        for (a, row) in rows.iter().enumerate() {
            for (f, v) in row.iter().enumerate() {
                data[f * n + a] = *v;
            }
        }
        Tensor::from_shape_vec(vec![1, 6, n], data).unwrap()
    }

    #[test]
    fn test_detect_scales_boxes_to_image() {
        let detector = YoloDetector::new(
            FakeBackend::new(output(&[
                [32.0, 32.0, 16.0, 8.0, 0.05, 0.9],
                [10.0, 10.0, 4.0, 4.0, 0.1, 0.1],
            ])),
            &config(),
        );
        let image = DynamicImage::new_rgb8(128, 256);

        let dets = detector.detect(&image).unwrap();
        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].class_id, 1);
        assert_eq!(dets[0].bbox, BBox::new(48.0, 112.0, 80.0, 144.0));
    }

    #[test]
    fn test_nms_keeps_best_per_class() {
        let dets = vec![
            DetectionBox { class_id: 1, confidence: 0.5, bbox: BBox::new(0.0, 0.0, 10.0, 10.0) },
            DetectionBox { class_id: 1, confidence: 0.9, bbox: BBox::new(1.0, 1.0, 11.0, 11.0) },
            DetectionBox { class_id: 0, confidence: 0.7, bbox: BBox::new(0.0, 0.0, 10.0, 10.0) },
            DetectionBox { class_id: 1, confidence: 0.3, bbox: BBox::new(50.0, 50.0, 60.0, 60.0) },
        ];

        let kept = non_max_suppression(dets, 0.45);
        let confidences: Vec<f32> = kept.iter().map(|d| d.confidence).collect();
        assert_eq!(confidences, vec![0.9, 0.7, 0.3]);
    }

    #[test]
    fn test_unexpected_output_shape() {
        let detector = YoloDetector::new(
            FakeBackend::new(Tensor::from_shape_vec(vec![1, 4], vec![0.0; 4]).unwrap()),
            &config(),
        );
        let err = detector.detect(&DynamicImage::new_rgb8(10, 10)).unwrap_err();
        assert!(err.to_string().contains("unexpected detector output"));
    }
}
