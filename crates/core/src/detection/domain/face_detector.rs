use crate::detection::domain::face_box::FaceBox;
use crate::detection::domain::landmark_provider::DetectionError;
use crate::shared::frame::Frame;

/// Domain interface for the first stage of landmarking: coarse face boxes.
///
/// Boxes are in frame pixel coordinates, sorted by descending score.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceBox>, DetectionError>;
}
