//! Refined face-mesh landmarks (478 points) with the anatomical indices the
//! engagement heuristics read.
//!
//! Coordinates are normalized to the frame: x by width, y by height. Depth is
//! dropped at the provider boundary.

use crate::detection::domain::landmark_provider::DetectionError;
use crate::shared::constants::REFINED_LANDMARK_COUNT;

pub const NOSE_TIP: usize = 1;
pub const UPPER_LIP: usize = 13;
pub const LOWER_LIP: usize = 14;
pub const LEFT_EYE_OUTER: usize = 33;
pub const LEFT_EYE_INNER: usize = 133;
pub const LEFT_EYE_BOTTOM: usize = 145;
pub const LEFT_EYE_TOP: usize = 159;
pub const LEFT_IRIS_CENTER: usize = 468;
pub const RIGHT_IRIS_CENTER: usize = 473;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LandmarkPoint {
    pub x: f64,
    pub y: f64,
}

impl LandmarkPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &LandmarkPoint) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FaceLandmarks {
    points: Vec<LandmarkPoint>,
}

impl FaceLandmarks {
    /// Wraps exactly [`REFINED_LANDMARK_COUNT`] points.
    pub fn new(points: Vec<LandmarkPoint>) -> Result<Self, DetectionError> {
        if points.len() != REFINED_LANDMARK_COUNT {
            return Err(DetectionError::LandmarkCount {
                expected: REFINED_LANDMARK_COUNT,
                actual: points.len(),
            });
        }
        Ok(Self { points })
    }

    pub fn point(&self, index: usize) -> LandmarkPoint {
        self.points[index]
    }

    pub fn points(&self) -> &[LandmarkPoint] {
        &self.points
    }

    /// Normalized `(min_x, min_y, max_x, max_y)` over all points.
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        self.points.iter().fold(
            (f64::MAX, f64::MAX, f64::MIN, f64::MIN),
            |(x0, y0, x1, y1), p| (x0.min(p.x), y0.min(p.y), x1.max(p.x), y1.max(p.y)),
        )
    }
}
