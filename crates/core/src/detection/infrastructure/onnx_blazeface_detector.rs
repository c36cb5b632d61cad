/// BlazeFace face detector using ONNX Runtime via `ort`.
///
/// First stage of landmarking: finds coarse face boxes that seed the
/// face-mesh crops. Runs only when the mesh provider has lost a track.
use std::path::Path;

use image::imageops::FilterType;

use crate::detection::domain::face_box::FaceBox;
use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::landmark_provider::DetectionError;
use crate::shared::frame::Frame;

use super::onnx_session::{self, ModelInput};

/// BlazeFace short-range input resolution.
const INPUT_SIZE: u32 = 128;

/// NMS IoU threshold.
const NMS_IOU_THRESH: f64 = 0.3;

/// Number of BlazeFace anchors (short-range model).
const NUM_ANCHORS: usize = 896;

/// Box deltas + 6 keypoints per anchor.
const REGRESSOR_STRIDE: usize = 16;

/// Raw scores are clipped before the sigmoid, as in the reference graph.
const SCORE_CLIP: f32 = 100.0;

/// BlazeFace detector backed by an ONNX Runtime session.
pub struct OnnxBlazefaceDetector {
    session: ort::session::Session,
    input: ModelInput,
    confidence: f64,
    anchors: Vec<[f32; 2]>,
}

impl OnnxBlazefaceDetector {
    /// Load a BlazeFace ONNX model.
    pub fn new(model_path: &Path, confidence: f64) -> Result<Self, Box<dyn std::error::Error>> {
        let session = onnx_session::build_session(model_path)?;
        let input = onnx_session::model_input(&session, INPUT_SIZE);
        Ok(Self {
            session,
            input,
            confidence,
            anchors: generate_anchors(),
        })
    }
}

impl FaceDetector for OnnxBlazefaceDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceBox>, DetectionError> {
        if frame.is_empty() {
            return Ok(Vec::new());
        }
        let fw = frame.width() as f32;
        let fh = frame.height() as f32;

        // 1. Preprocess: stretch to 128x128, normalize to [-1,1]
        let resized = image::imageops::resize(
            &frame.as_image(),
            self.input.size,
            self.input.size,
            FilterType::Triangle,
        );
        let tensor = onnx_session::image_to_tensor(&resized, self.input.layout, |p| {
            p as f32 / 127.5 - 1.0
        });

        // 2. Inference
        let input_value =
            ort::value::Tensor::from_array(tensor).map_err(DetectionError::inference)?;
        let outputs = self
            .session
            .run(ort::inputs![input_value])
            .map_err(DetectionError::inference)?;

        // BlazeFace outputs two tensors:
        // - regressors: [1, 896, 16] (box deltas + keypoints)
        // - classificators: [1, 896, 1] (confidence logits)
        if outputs.len() < 2 {
            return Err(DetectionError::UnexpectedOutput(format!(
                "BlazeFace model expected 2 outputs, got {}",
                outputs.len()
            )));
        }
        let regressors = outputs[0]
            .try_extract_array::<f32>()
            .map_err(DetectionError::inference)?;
        let scores = outputs[1]
            .try_extract_array::<f32>()
            .map_err(DetectionError::inference)?;
        let reg_data: Vec<f32> = regressors.iter().copied().collect();
        let score_data: Vec<f32> = scores.iter().copied().collect();

        // 3. Decode anchor boxes + filter by confidence
        let scale = self.input.size as f32;
        let mut raw = Vec::new();
        for (i, &logit) in score_data.iter().enumerate().take(self.anchors.len()) {
            let score = onnx_session::sigmoid(logit.clamp(-SCORE_CLIP, SCORE_CLIP));
            if (score as f64) < self.confidence {
                continue;
            }
            let offset = i * REGRESSOR_STRIDE;
            if offset + 4 > reg_data.len() {
                break;
            }

            let anchor = self.anchors[i];
            let cx = anchor[0] + reg_data[offset] / scale;
            let cy = anchor[1] + reg_data[offset + 1] / scale;
            let w = reg_data[offset + 2] / scale;
            let h = reg_data[offset + 3] / scale;

            raw.push(FaceBox {
                x1: (((cx - w / 2.0) * fw).max(0.0)) as f64,
                y1: (((cy - h / 2.0) * fh).max(0.0)) as f64,
                x2: (((cx + w / 2.0) * fw).min(fw)) as f64,
                y2: (((cy + h / 2.0) * fh).min(fh)) as f64,
                score: score as f64,
            });
        }

        // 4. NMS
        Ok(onnx_session::nms(raw, NMS_IOU_THRESH))
    }
}

/// Generate BlazeFace anchors for the short-range model.
///
/// Two feature maps, 16×16 and 8×8, with 2 and 6 anchors per cell.
fn generate_anchors() -> Vec<[f32; 2]> {
    let strides = [(8, 2), (16, 6)]; // (stride, anchors_per_cell)
    let mut anchors = Vec::with_capacity(NUM_ANCHORS);

    for &(stride, num) in &strides {
        let grid_size = INPUT_SIZE as usize / stride;
        for y in 0..grid_size {
            for x in 0..grid_size {
                let cx = (x as f32 + 0.5) / grid_size as f32;
                let cy = (y as f32 + 0.5) / grid_size as f32;
                for _ in 0..num {
                    anchors.push([cx, cy]);
                }
            }
        }
    }

    anchors
}
