use thiserror::Error;

use crate::detection::domain::face_landmarks::FaceLandmarks;
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("landmark model failed: {0}")]
    Inference(String),
    #[error("unexpected model output: {0}")]
    UnexpectedOutput(String),
    #[error("expected {expected} landmarks per face, got {actual}")]
    LandmarkCount { expected: usize, actual: usize },
}

impl DetectionError {
    pub fn inference(err: impl std::fmt::Display) -> Self {
        Self::Inference(err.to_string())
    }
}

/// Domain interface for the face-mesh collaborator.
///
/// Implementations may track faces across calls, hence `&mut self`. A frame
/// without a detectable face is `Ok(vec![])`, not an error.
pub trait LandmarkProvider: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceLandmarks>, DetectionError>;
}
