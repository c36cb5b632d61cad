/// Refined face-mesh landmark model using ONNX Runtime via `ort`.
///
/// Regresses 478 landmarks plus a face-presence logit from a single face
/// crop. Outputs are told apart by size, so both the two-output and the
/// multi-output exports load.
use std::path::Path;

use image::imageops::FilterType;
use image::RgbImage;

use crate::detection::domain::face_landmarks::LandmarkPoint;
use crate::detection::domain::face_mesh_model::{FaceMeshModel, MeshOutput};
use crate::detection::domain::landmark_provider::DetectionError;

use super::onnx_session::{self, ModelInput};

/// Face-mesh input resolution.
const INPUT_SIZE: u32 = 192;

/// Values per landmark in the mesh output (x, y, z).
const LANDMARK_STRIDE: usize = 3;

pub struct OnnxFaceMeshModel {
    session: ort::session::Session,
    input: ModelInput,
}

impl OnnxFaceMeshModel {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let session = onnx_session::build_session(model_path)?;
        let input = onnx_session::model_input(&session, INPUT_SIZE);
        log::debug!(
            "Face mesh input: {}x{} {:?}",
            input.size,
            input.size,
            input.layout
        );
        Ok(Self { session, input })
    }
}

impl FaceMeshModel for OnnxFaceMeshModel {
    fn infer(&mut self, crop: &RgbImage) -> Result<MeshOutput, DetectionError> {
        let size = self.input.size;
        let resized = image::imageops::resize(crop, size, size, FilterType::Triangle);
        let tensor = onnx_session::image_to_tensor(&resized, self.input.layout, |p| p as f32 / 255.0);

        let input_value =
            ort::value::Tensor::from_array(tensor).map_err(DetectionError::inference)?;
        let outputs = self
            .session
            .run(ort::inputs![input_value])
            .map_err(DetectionError::inference)?;

        let mut tensors = Vec::with_capacity(outputs.len());
        for i in 0..outputs.len() {
            let array = outputs[i]
                .try_extract_array::<f32>()
                .map_err(DetectionError::inference)?;
            tensors.push(array.iter().copied().collect::<Vec<f32>>());
        }
        let (landmarks, presence_logit) = split_mesh_outputs(tensors)?;

        Ok(MeshOutput {
            points: to_crop_points(&landmarks, size),
            presence: onnx_session::sigmoid(presence_logit) as f64,
        })
    }
}

/// Input-pixel landmark coordinates → crop-normalized points; z is dropped.
fn to_crop_points(landmarks: &[f32], input_size: u32) -> Vec<LandmarkPoint> {
    let side = input_size as f64;
    landmarks
        .chunks_exact(LANDMARK_STRIDE)
        .map(|v| LandmarkPoint::new(v[0] as f64 / side, v[1] as f64 / side))
        .collect()
}

/// Picks the landmark tensor (largest) and the face-presence logit (scalar).
fn split_mesh_outputs(tensors: Vec<Vec<f32>>) -> Result<(Vec<f32>, f32), DetectionError> {
    let presence = tensors
        .iter()
        .find(|t| t.len() == 1)
        .map(|t| t[0])
        .ok_or_else(|| {
            DetectionError::UnexpectedOutput("face mesh model has no face-presence output".into())
        })?;
    let landmarks = tensors
        .into_iter()
        .filter(|t| t.len() > 1)
        .max_by_key(|t| t.len())
        .ok_or_else(|| {
            DetectionError::UnexpectedOutput("face mesh model has no landmark output".into())
        })?;
    if landmarks.len() % LANDMARK_STRIDE != 0 {
        return Err(DetectionError::UnexpectedOutput(format!(
            "landmark tensor length {} is not a multiple of {LANDMARK_STRIDE}",
            landmarks.len()
        )));
    }
    Ok((landmarks, presence))
}
