use std::time::Instant;

/// Running blink bookkeeping for one interview session.
///
/// Created when the session's first frame arrives and mutated only by
/// [`MetricsEngine::compute`](super::metrics_engine::MetricsEngine::compute).
#[derive(Clone, Debug, PartialEq)]
pub struct EngineState {
    pub blink_counter: u64,
    /// `None` until the first blink is counted.
    pub last_blink_time: Option<Instant>,
    pub stream_start_time: Instant,
    /// Blinks per minute, full precision.
    pub current_blink_rate: f64,
}

impl EngineState {
    pub fn new(stream_start_time: Instant) -> Self {
        Self {
            blink_counter: 0,
            last_blink_time: None,
            stream_start_time,
            current_blink_rate: 0.0,
        }
    }
}
