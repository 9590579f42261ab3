use crate::shared::frame::Frame;

use super::detection::Detection;

/// Error type returned by detection backends.
pub type BackendError = Box<dyn std::error::Error + Send + Sync>;

/// Domain interface for face detection.
///
/// Backends hold inference sessions that need exclusive access to run,
/// hence `&mut self`. They keep no state between frames.
pub trait FaceDetector: Send {
    /// Detected faces ordered by descending confidence.
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, BackendError>;
}
