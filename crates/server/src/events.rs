//! Socket.IO event names and payloads.

use serde::Deserialize;

pub const VIDEO_FRAME_EVENT: &str = "video_frame";
pub const FACE_DATA_EVENT: &str = "face_data";

/// Payload of a `video_frame` event.
#[derive(Debug, Clone, Deserialize)]
pub struct VideoFrame {
    /// Data-URI encoded image, e.g. `data:image/jpeg;base64,...`.
    pub image: String,
}
