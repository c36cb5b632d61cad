/// Two-stage refined face-mesh landmark provider.
///
/// MediaPipe style: a [`FaceDetector`] seeds a region of interest, the
/// [`FaceMeshModel`] then regresses 478 landmarks inside that crop. While the
/// mesh keeps reporting a confident face, the next frame's ROI comes from the
/// previous landmarks and the detector is skipped.
use crate::detection::domain::face_box::{FaceBox, DEFAULT_TRACK_IOU_THRESHOLD, ROI_SCALE};
use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::face_landmarks::{FaceLandmarks, LandmarkPoint};
use crate::detection::domain::face_mesh_model::FaceMeshModel;
use crate::detection::domain::landmark_provider::{DetectionError, LandmarkProvider};
use crate::shared::constants::{
    DEFAULT_MAX_FACES, DEFAULT_MIN_DETECTION_CONFIDENCE, DEFAULT_MIN_TRACKING_CONFIDENCE,
};
use crate::shared::frame::{Frame, RgbView};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceMeshConfig {
    pub max_faces: usize,
    pub min_detection_confidence: f64,
    pub min_tracking_confidence: f64,
}

impl Default for FaceMeshConfig {
    fn default() -> Self {
        Self {
            max_faces: DEFAULT_MAX_FACES,
            min_detection_confidence: DEFAULT_MIN_DETECTION_CONFIDENCE,
            min_tracking_confidence: DEFAULT_MIN_TRACKING_CONFIDENCE,
        }
    }
}

pub struct FaceMeshProvider {
    mesh: Box<dyn FaceMeshModel>,
    detector: Box<dyn FaceDetector>,
    config: FaceMeshConfig,
    /// Boxes carried over from the previous frame's landmarks.
    tracks: Vec<FaceBox>,
}

impl FaceMeshProvider {
    pub fn new(
        mesh: Box<dyn FaceMeshModel>,
        detector: Box<dyn FaceDetector>,
        config: FaceMeshConfig,
    ) -> Self {
        Self {
            mesh,
            detector,
            config,
            tracks: Vec::new(),
        }
    }

    /// Fresh detections that are confident and not already tracked.
    fn new_detections(
        &mut self,
        frame: &Frame,
        existing: &[FaceBox],
    ) -> Result<Vec<FaceBox>, DetectionError> {
        let room = self.config.max_faces.saturating_sub(existing.len());
        if room == 0 {
            return Ok(Vec::new());
        }
        let detections = self.detector.detect(frame)?;
        Ok(select_new_faces(
            detections,
            existing,
            self.config.min_detection_confidence,
            room,
        ))
    }

    /// Runs the mesh on each ROI; returns the confident faces and their
    /// follow-up boxes for the next frame.
    fn landmark_rois(
        &mut self,
        image: &RgbView<'_>,
        rois: &[FaceBox],
    ) -> Result<(Vec<FaceLandmarks>, Vec<FaceBox>), DetectionError> {
        let (fw, fh) = image.dimensions();
        let mut faces = Vec::new();
        let mut next: Vec<FaceBox> = Vec::new();

        for roi in rois {
            let Some((face, presence)) = self.run_mesh(image, roi)? else {
                continue;
            };
            if presence < self.config.min_tracking_confidence {
                log::debug!("Dropping track: face presence {presence:.2}");
                continue;
            }
            let follow_up = FaceBox::from_landmarks(&face, fw, fh, presence);
            // Two tracks converged on the same face
            if next
                .iter()
                .any(|b| b.iou(&follow_up) > DEFAULT_TRACK_IOU_THRESHOLD)
            {
                continue;
            }
            next.push(follow_up);
            faces.push(face);
        }
        Ok((faces, next))
    }

    fn run_mesh(
        &mut self,
        image: &RgbView<'_>,
        roi: &FaceBox,
    ) -> Result<Option<(FaceLandmarks, f64)>, DetectionError> {
        let (fw, fh) = image.dimensions();
        let Some(crop) = roi.square_roi(ROI_SCALE).clip(fw, fh) else {
            return Ok(None);
        };

        let patch = image::imageops::crop_imm(image, crop.x, crop.y, crop.width, crop.height)
            .to_image();
        let output = self.mesh.infer(&patch)?;

        let points = output
            .points
            .iter()
            .map(|p| {
                LandmarkPoint::new(
                    (crop.x as f64 + p.x * crop.width as f64) / fw as f64,
                    (crop.y as f64 + p.y * crop.height as f64) / fh as f64,
                )
            })
            .collect();
        let face = FaceLandmarks::new(points)?;
        Ok(Some((face, output.presence)))
    }
}

impl LandmarkProvider for FaceMeshProvider {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceLandmarks>, DetectionError> {
        if frame.is_empty() {
            self.tracks.clear();
            return Ok(Vec::new());
        }
        let image = frame.as_image();

        // Any error below leaves `tracks` empty, so the next frame re-detects.
        let mut rois = std::mem::take(&mut self.tracks);
        let mut detected = false;
        if rois.len() < self.config.max_faces {
            let fresh = self.new_detections(frame, &rois)?;
            rois.extend(fresh);
            detected = true;
        }

        let (mut faces, mut next) = self.landmark_rois(&image, &rois)?;

        // A lost track gets one immediate re-detection on the same frame.
        if faces.len() < self.config.max_faces && !detected {
            let fresh = self.new_detections(frame, &next)?;
            let (more_faces, more_next) = self.landmark_rois(&image, &fresh)?;
            faces.extend(more_faces);
            next.extend(more_next);
        }

        self.tracks = next;
        Ok(faces)
    }
}

/// Keeps at most `room` confident detections that don't overlap a track.
fn select_new_faces(
    detections: Vec<FaceBox>,
    existing: &[FaceBox],
    min_confidence: f64,
    room: usize,
) -> Vec<FaceBox> {
    detections
        .into_iter()
        .filter(|d| d.score >= min_confidence)
        .filter(|d| {
            existing
                .iter()
                .all(|t| t.iou(d) <= DEFAULT_TRACK_IOU_THRESHOLD)
        })
        .take(room)
        .collect()
}
