/// One frame's engagement readout, full precision.
///
/// Rounding to two decimals happens only when the metrics are serialized
/// onto the wire.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EngagementMetrics {
    pub face_count: usize,
    /// In [0, 1].
    pub eye_contact: f64,
    /// In [0, 1].
    pub speaking: f64,
    /// Blinks per minute since the session started, ≥ 0.
    pub blink_rate: f64,
}
