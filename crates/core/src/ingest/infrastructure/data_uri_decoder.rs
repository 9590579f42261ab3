use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;

use crate::ingest::domain::frame_decoder::{DecodeError, FrameDecoder};
use crate::shared::frame::Frame;

/// Standard alphabet that tolerates non-zero bits in the final symbol, as
/// some encoders emit them.
const LENIENT_STANDARD: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

/// Decodes `data:image/...;base64,<payload>` strings as sent by a browser
/// canvas. Any format the `image` crate recognizes is accepted.
#[derive(Debug, Default, Clone, Copy)]
pub struct DataUriDecoder;

impl DataUriDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl FrameDecoder for DataUriDecoder {
    fn decode(&self, encoded: &str) -> Result<Frame, DecodeError> {
        let payload = strip_header(encoded)?;
        let bytes = LENIENT_STANDARD.decode(base64_symbols(payload))?;
        if bytes.is_empty() {
            return Err(DecodeError::Image(None));
        }

        let image = image::load_from_memory(&bytes)
            .map_err(|e| DecodeError::Image(Some(e)))?
            .to_rgb8();
        if image.width() == 0 || image.height() == 0 {
            return Err(DecodeError::Image(None));
        }

        Ok(Frame::from_rgb_image(image))
    }
}

/// Payload between the header's `,` and the next `,` (base64 never contains one).
fn strip_header(encoded: &str) -> Result<&str, DecodeError> {
    let (_, rest) = encoded
        .split_once(',')
        .ok_or(DecodeError::MissingSeparator)?;
    Ok(rest.split(',').next().unwrap_or(rest))
}

/// Drops characters outside the base64 alphabet, such as line breaks
/// inserted by MIME encoders.
fn base64_symbols(payload: &str) -> String {
    payload
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '='))
        .collect()
}
