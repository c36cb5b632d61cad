/// BlazeFace short-range detector exported to ONNX.
pub const FACE_DETECTION_MODEL_NAME: &str = "face_detection_short_range.onnx";

/// Face-mesh landmark model with iris refinement, exported to ONNX.
pub const FACE_MESH_MODEL_NAME: &str = "face_landmark_refined.onnx";

/// Landmarks per face with iris refinement (468 mesh + 2 × 5 iris).
pub const REFINED_LANDMARK_COUNT: usize = 478;

/// Eye aspect ratio below which the left eye counts as closed.
pub const DEFAULT_BLINK_EAR_THRESHOLD: f64 = 0.22;

/// Minimum gap between two counted blinks.
pub const DEFAULT_BLINK_DEBOUNCE_MS: u64 = 200;

pub const DEFAULT_EYE_CONTACT_GAIN: f64 = 5.0;
pub const DEFAULT_SPEAKING_GAIN: f64 = 15.0;

pub const DEFAULT_MIN_DETECTION_CONFIDENCE: f64 = 0.5;
pub const DEFAULT_MIN_TRACKING_CONFIDENCE: f64 = 0.5;
pub const DEFAULT_MAX_FACES: usize = 1;
