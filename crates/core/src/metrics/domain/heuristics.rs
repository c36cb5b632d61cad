//! Per-face engagement heuristics over normalized landmarks.
//!
//! These are cheap proxies, not biometrics: the gains are calibrated
//! constants and the clamps keep scores in [0, 1].

use crate::detection::domain::face_landmarks::{
    FaceLandmarks, LEFT_EYE_BOTTOM, LEFT_EYE_INNER, LEFT_EYE_OUTER, LEFT_EYE_TOP,
    LEFT_IRIS_CENTER, LOWER_LIP, NOSE_TIP, RIGHT_IRIS_CENTER, UPPER_LIP,
};

/// Horizontal alignment of the iris midpoint with the nose tip.
///
/// 1.0 when they share an x coordinate, falling linearly with `gain`.
pub fn eye_contact_score(face: &FaceLandmarks, gain: f64) -> f64 {
    let iris_mid_x = (face.point(LEFT_IRIS_CENTER).x + face.point(RIGHT_IRIS_CENTER).x) / 2.0;
    let offset = (iris_mid_x - face.point(NOSE_TIP).x).abs();
    unit_clamp(1.0 - offset * gain)
}

/// Left-eye aspect ratio: lid gap over corner-to-corner width.
///
/// `None` when the eye corners coincide and the ratio is undefined.
pub fn left_eye_aspect_ratio(face: &FaceLandmarks) -> Option<f64> {
    let vertical = face.point(LEFT_EYE_TOP).distance(&face.point(LEFT_EYE_BOTTOM));
    let horizontal = face
        .point(LEFT_EYE_OUTER)
        .distance(&face.point(LEFT_EYE_INNER));
    if horizontal <= 0.0 {
        return None;
    }
    let ear = vertical / horizontal;
    ear.is_finite().then_some(ear)
}

/// Mouth opening between the inner lip midpoints, scaled by `gain`.
pub fn speaking_score(face: &FaceLandmarks, gain: f64) -> f64 {
    let opening = face.point(UPPER_LIP).distance(&face.point(LOWER_LIP));
    unit_clamp(opening * gain)
}

/// Clamp into [0, 1]; NaN maps to 0.
fn unit_clamp(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::detection::domain::face_landmarks::*;
    use crate::shared::constants::REFINED_LANDMARK_COUNT;

    /// Face builder that only places the landmarks the heuristics read.
    pub struct FaceBuilder {
        points: Vec<LandmarkPoint>,
    }

    impl FaceBuilder {
        /// Frontal face, eyes open (EAR 0.3), mouth closed.
        pub fn new() -> Self {
            let mut points = vec![LandmarkPoint::new(0.5, 0.5); REFINED_LANDMARK_COUNT];
            points[NOSE_TIP] = LandmarkPoint::new(0.5, 0.55);
            points[LEFT_IRIS_CENTER] = LandmarkPoint::new(0.45, 0.45);
            points[RIGHT_IRIS_CENTER] = LandmarkPoint::new(0.55, 0.45);
            points[UPPER_LIP] = LandmarkPoint::new(0.5, 0.65);
            points[LOWER_LIP] = LandmarkPoint::new(0.5, 0.65);
            Self { points }.ear(0.3)
        }

        pub fn iris_x(mut self, left: f64, right: f64) -> Self {
            self.points[LEFT_IRIS_CENTER].x = left;
            self.points[RIGHT_IRIS_CENTER].x = right;
            self
        }

        pub fn nose_x(mut self, x: f64) -> Self {
            self.points[NOSE_TIP].x = x;
            self
        }

        /// Left eye 0.1 wide with a lid gap giving the requested EAR.
        pub fn ear(mut self, ear: f64) -> Self {
            self.points[LEFT_EYE_OUTER] = LandmarkPoint::new(0.40, 0.45);
            self.points[LEFT_EYE_INNER] = LandmarkPoint::new(0.50, 0.45);
            self.points[LEFT_EYE_TOP] = LandmarkPoint::new(0.45, 0.45 - ear * 0.1 / 2.0);
            self.points[LEFT_EYE_BOTTOM] = LandmarkPoint::new(0.45, 0.45 + ear * 0.1 / 2.0);
            self
        }

        pub fn mouth_opening(mut self, gap: f64) -> Self {
            self.points[UPPER_LIP] = LandmarkPoint::new(0.5, 0.65);
            self.points[LOWER_LIP] = LandmarkPoint::new(0.5, 0.65 + gap);
            self
        }

        pub fn collapse_eye_corners(mut self) -> Self {
            self.points[LEFT_EYE_INNER] = self.points[LEFT_EYE_OUTER];
            self
        }

        pub fn build(self) -> FaceLandmarks {
            FaceLandmarks::new(self.points).unwrap()
        }
    }
}
