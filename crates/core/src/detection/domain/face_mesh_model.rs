use image::RgbImage;

use crate::detection::domain::face_landmarks::LandmarkPoint;
use crate::detection::domain::landmark_provider::DetectionError;

/// Landmarks for the single face filling a crop.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshOutput {
    /// Normalized to the crop: (0, 0) is its top-left, (1, 1) its bottom-right.
    pub points: Vec<LandmarkPoint>,
    /// Probability that the crop actually contains a face, in [0, 1].
    pub presence: f64,
}

/// Domain interface for the second-stage landmark regressor.
///
/// Sees only the face crop; mapping back to frame coordinates and deciding
/// which crops to run belongs to the caller.
pub trait FaceMeshModel: Send {
    fn infer(&mut self, crop: &RgbImage) -> Result<MeshOutput, DetectionError>;
}
