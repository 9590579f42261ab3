use serde::{Deserialize, Serialize};

use crate::detection::domain::analyzer_error::AnalyzerError;
use crate::ingest::domain::frame_decoder::DecodeError;
use crate::shared::constants::{MULTIPLE_FACES_WARNING, NO_FACE_WARNING};

/// Per-face annotation sent back to the client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FaceRecord {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub confidence: f64,
    pub eye_contact_percentage: f64,
}

/// Everything reported for one frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameResult {
    pub faces: Vec<FaceRecord>,
    pub total_faces: usize,
    pub warnings: Vec<String>,
    /// ISO 8601 local time with offset.
    pub timestamp: String,
}

impl FrameResult {
    pub fn new(faces: Vec<FaceRecord>, timestamp: String) -> Self {
        let warnings = warnings_for(faces.len());
        Self {
            total_faces: faces.len(),
            faces,
            warnings,
            timestamp,
        }
    }
}

pub fn warnings_for(face_count: usize) -> Vec<String> {
    match face_count {
        0 => vec![NO_FACE_WARNING.to_string()],
        1 => Vec::new(),
        _ => vec![MULTIPLE_FACES_WARNING.to_string()],
    }
}

#[derive(thiserror::Error, Debug)]
pub enum FrameError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Analyzer(#[from] AnalyzerError),
}

/// Wire shape of a frame outcome: the result itself, or `{ "error": ... }`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FrameResponse {
    Result(FrameResult),
    Error { error: String },
}

impl FrameResponse {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error: message.into(),
        }
    }
}

impl From<Result<FrameResult, FrameError>> for FrameResponse {
    fn from(outcome: Result<FrameResult, FrameError>) -> Self {
        match outcome {
            Ok(result) => Self::Result(result),
            Err(e) => Self::error(e.to_string()),
        }
    }
}
