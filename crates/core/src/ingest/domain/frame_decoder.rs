use thiserror::Error;

use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Malformed data URI: missing ',' before the image payload")]
    MissingSeparator,
    #[error("Invalid base64 image payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("Failed to decode image")]
    Image(#[source] Option<image::ImageError>),
}

/// Turns one transport-encoded image into an RGB [`Frame`].
pub trait FrameDecoder: Send {
    fn decode(&self, encoded: &str) -> Result<Frame, DecodeError>;
}
