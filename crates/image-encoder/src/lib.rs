//! Image Encoder
//!
//! Turns a live frame into a self-contained JPEG data URI, capped at a
//! maximum width with the aspect ratio preserved.

mod encoder;

pub use encoder::{scale_factor, target_dimensions, EncodedImage, ImageEncoder};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Encoding errors
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("Frame not ready ({width}x{height})")]
    NotReady { width: u32, height: u32 },

    #[error("Frame buffer is {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },

    #[error("JPEG encoding failed: {0}")]
    Codec(#[from] image::ImageError),
}

/// Encoder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Widest output image in pixels
    pub max_width: u32,
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            max_width: 720,
            jpeg_quality: 90,
        }
    }
}
