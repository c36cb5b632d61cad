use thiserror::Error;

use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("frame has no header separator (expected \"<header>,<base64>\")")]
    MissingSeparator,
    #[error("frame payload is empty")]
    EmptyPayload,
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("unsupported or corrupt image: {0}")]
    Image(#[from] image::ImageError),
}

/// Domain interface for turning an encoded frame string into pixels.
pub trait FrameDecoder: Send {
    fn decode(&self, encoded: &str) -> Result<Frame, DecodeError>;
}
