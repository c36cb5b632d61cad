use crate::detection::domain::face_landmarks::FaceLandmarks;

/// IoU above which a fresh detection is considered the same face as a track.
pub const DEFAULT_TRACK_IOU_THRESHOLD: f64 = 0.5;

/// Expansion applied when turning a box into a face-mesh crop.
///
/// The mesh model expects the face to fill roughly two thirds of its input.
pub const ROI_SCALE: f64 = 1.5;

/// Axis-aligned face box in frame pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub score: f64,
}

/// Integer crop rectangle fully inside the frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl FaceBox {
    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    /// Tight box around a face's landmarks, scaled back to pixels.
    pub fn from_landmarks(face: &FaceLandmarks, frame_w: u32, frame_h: u32, score: f64) -> Self {
        let (x0, y0, x1, y1) = face.bounds();
        Self {
            x1: x0 * frame_w as f64,
            y1: y0 * frame_h as f64,
            x2: x1 * frame_w as f64,
            y2: y1 * frame_h as f64,
            score,
        }
    }

    pub fn iou(&self, other: &FaceBox) -> f64 {
        let ix1 = self.x1.max(other.x1);
        let iy1 = self.y1.max(other.y1);
        let ix2 = self.x2.min(other.x2);
        let iy2 = self.y2.min(other.y2);

        let inter = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
        if inter == 0.0 {
            return 0.0;
        }
        let area_a = self.width() * self.height();
        let area_b = other.width() * other.height();
        inter / (area_a + area_b - inter)
    }

    /// Square box around the center, side = longest edge × `scale`.
    pub fn square_roi(&self, scale: f64) -> FaceBox {
        let (cx, cy) = self.center();
        let half = self.width().max(self.height()) * scale / 2.0;
        FaceBox {
            x1: cx - half,
            y1: cy - half,
            x2: cx + half,
            y2: cy + half,
            score: self.score,
        }
    }

    /// Clips to the frame. `None` when nothing of the box is visible.
    pub fn clip(&self, frame_w: u32, frame_h: u32) -> Option<CropRect> {
        let x1 = self.x1.max(0.0).floor();
        let y1 = self.y1.max(0.0).floor();
        let x2 = self.x2.min(frame_w as f64).ceil();
        let y2 = self.y2.min(frame_h as f64).ceil();
        if x2 - x1 < 1.0 || y2 - y1 < 1.0 {
            return None;
        }
        Some(CropRect {
            x: x1 as u32,
            y: y1 as u32,
            width: (x2 - x1) as u32,
            height: (y2 - y1) as u32,
        })
    }
}
