//! Line-delimited JSON wire types.

use serde::{Deserialize, Serialize, Serializer};

use crate::metrics::domain::engagement_metrics::EngagementMetrics;

/// One inbound line: a video frame for an interview.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct FrameMessage {
    #[serde(rename = "interviewId", alias = "sessionId")]
    pub interview_id: String,
    /// `<header>,<base64 image bytes>`, e.g. a `data:image/jpeg;base64,...` URL.
    pub frame: String,
}

/// One outbound line.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MetricsMessage {
    pub interview_id: String,
    pub metrics: WireMetrics,
}

impl MetricsMessage {
    pub fn new(interview_id: impl Into<String>, metrics: EngagementMetrics) -> Self {
        Self {
            interview_id: interview_id.into(),
            metrics: WireMetrics(metrics),
        }
    }
}

/// Serialized view of [`EngagementMetrics`] with scores rounded to two
/// decimals.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WireMetrics(pub EngagementMetrics);

impl Serialize for WireMetrics {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Repr {
            face_count: usize,
            eye_contact: f64,
            speaking: f64,
            blink_rate: f64,
        }

        let m = &self.0;
        Repr {
            face_count: m.face_count,
            eye_contact: round2(m.eye_contact),
            speaking: round2(m.speaking),
            blink_rate: round2(m.blink_rate),
        }
        .serialize(serializer)
    }
}

/// Round-half-to-even to two decimals; non-finite values become 0.
pub fn round2(v: f64) -> f64 {
    if !v.is_finite() {
        return 0.0;
    }
    (v * 100.0).round_ties_even() / 100.0
}
