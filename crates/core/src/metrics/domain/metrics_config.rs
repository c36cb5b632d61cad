use std::time::Duration;

use crate::shared::constants::{
    DEFAULT_BLINK_DEBOUNCE_MS, DEFAULT_BLINK_EAR_THRESHOLD, DEFAULT_EYE_CONTACT_GAIN,
    DEFAULT_SPEAKING_GAIN,
};

/// Calibrated constants of the engagement heuristics.
///
/// Defaults must stay as they are for parity with existing consumers; they
/// are exposed only so deployments can experiment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MetricsConfig {
    pub blink_ear_threshold: f64,
    pub blink_debounce: Duration,
    pub eye_contact_gain: f64,
    pub speaking_gain: f64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            blink_ear_threshold: DEFAULT_BLINK_EAR_THRESHOLD,
            blink_debounce: Duration::from_millis(DEFAULT_BLINK_DEBOUNCE_MS),
            eye_contact_gain: DEFAULT_EYE_CONTACT_GAIN,
            speaking_gain: DEFAULT_SPEAKING_GAIN,
        }
    }
}
