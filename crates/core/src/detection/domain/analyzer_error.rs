use thiserror::Error;

use super::face_detector::BackendError;

/// Failure of one of the analysis capabilities while processing a frame.
#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("face detection failed: {0}")]
    Detection(#[source] BackendError),
    #[error("landmark extraction failed: {0}")]
    Landmarks(#[source] BackendError),
}
