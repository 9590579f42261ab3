use crate::shared::frame::Frame;

use super::face_detector::BackendError;
use super::face_landmarks::LandmarkSet;

/// Domain interface for facial landmark extraction.
///
/// Runs independently of [`FaceDetector`](super::face_detector::FaceDetector):
/// the i-th landmark set is only assumed to belong to the i-th detection.
pub trait LandmarkDetector: Send {
    fn landmarks(&mut self, frame: &Frame) -> Result<Vec<LandmarkSet>, BackendError>;
}
