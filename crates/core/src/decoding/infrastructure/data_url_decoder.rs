//! Decodes `data:image/...;base64,<payload>` frame strings with the `image` crate.
//!
//! Only the first comma is significant: everything after it is the base64
//! payload. The header itself is not inspected, the container format is
//! sniffed from the bytes.
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::{alphabet, Engine};

use crate::decoding::domain::frame_decoder::{DecodeError, FrameDecoder};
use crate::shared::frame::Frame;

/// Standard alphabet; browsers sometimes strip the trailing `=`.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Default)]
pub struct DataUrlDecoder;

impl DataUrlDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl FrameDecoder for DataUrlDecoder {
    fn decode(&self, encoded: &str) -> Result<Frame, DecodeError> {
        let (_header, payload) = encoded
            .split_once(',')
            .ok_or(DecodeError::MissingSeparator)?;
        let payload = payload.trim();
        if payload.is_empty() {
            return Err(DecodeError::EmptyPayload);
        }

        let bytes = PAYLOAD_ENGINE.decode(payload)?;
        if bytes.is_empty() {
            return Err(DecodeError::EmptyPayload);
        }

        let rgb = image::load_from_memory(&bytes)?.to_rgb8();
        Ok(Frame::from(rgb))
    }
}
