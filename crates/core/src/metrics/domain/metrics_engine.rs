//! Stateful per-frame metrics: eye contact, speaking, debounced blink
//! counting and a running blink rate.

use std::time::Instant;

use crate::detection::domain::face_landmarks::FaceLandmarks;
use crate::metrics::domain::engagement_metrics::EngagementMetrics;
use crate::metrics::domain::engine_state::EngineState;
use crate::metrics::domain::heuristics::{eye_contact_score, left_eye_aspect_ratio, speaking_score};
use crate::metrics::domain::metrics_config::MetricsConfig;

/// Left-eye state as seen on a single frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlinkPhase {
    /// EAR at or above threshold, or undefined.
    Open,
    /// EAR below threshold; `counted` when this frame incremented the counter.
    Closed { counted: bool },
}

pub struct MetricsEngine {
    config: MetricsConfig,
}

impl MetricsEngine {
    pub fn new(config: MetricsConfig) -> Self {
        Self { config }
    }

    /// Computes one frame's metrics and advances `state`.
    ///
    /// With no faces the state is left untouched and the previous blink rate
    /// is reported. With several faces every face is processed in order and
    /// the last one's scores are reported.
    pub fn compute(
        &self,
        faces: &[FaceLandmarks],
        now: Instant,
        state: &mut EngineState,
    ) -> EngagementMetrics {
        let mut metrics = EngagementMetrics {
            face_count: faces.len(),
            eye_contact: 0.0,
            speaking: 0.0,
            blink_rate: state.current_blink_rate,
        };

        for face in faces {
            metrics.eye_contact = eye_contact_score(face, self.config.eye_contact_gain);

            if let BlinkPhase::Closed { counted: true } = self.observe_eye(face, now, state) {
                log::debug!("Blink #{} counted", state.blink_counter);
            }

            self.refresh_blink_rate(now, state);
            metrics.blink_rate = state.current_blink_rate;

            metrics.speaking = speaking_score(face, self.config.speaking_gain);
        }

        metrics
    }

    /// Debounced edge detector: a closed eye counts only once the debounce
    /// window since the last counted blink has passed.
    fn observe_eye(&self, face: &FaceLandmarks, now: Instant, state: &mut EngineState) -> BlinkPhase {
        let Some(ear) = left_eye_aspect_ratio(face) else {
            return BlinkPhase::Open;
        };
        if ear >= self.config.blink_ear_threshold {
            return BlinkPhase::Open;
        }

        let window_expired = state
            .last_blink_time
            .map_or(true, |last| now.saturating_duration_since(last) >= self.config.blink_debounce);
        if window_expired {
            state.blink_counter += 1;
            state.last_blink_time = Some(now);
        }
        BlinkPhase::Closed {
            counted: window_expired,
        }
    }

    fn refresh_blink_rate(&self, now: Instant, state: &mut EngineState) {
        let elapsed_min = now
            .saturating_duration_since(state.stream_start_time)
            .as_secs_f64()
            / 60.0;
        if elapsed_min > 0.0 {
            state.current_blink_rate = state.blink_counter as f64 / elapsed_min;
        }
    }
}

impl Default for MetricsEngine {
    fn default() -> Self {
        Self::new(MetricsConfig::default())
    }
}
