//! Resize and JPEG encode

use crate::{EncodeError, EncoderConfig};
use base64::Engine;
use camera_capture::VideoFrame;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use tracing::debug;

const DATA_URI_PREFIX: &str = "data:image/jpeg;base64,";

/// Scale applied to a frame of `native_width` so it is at most `max_width` wide.
/// Never upscales.
pub fn scale_factor(native_width: u32, max_width: u32) -> f64 {
    if native_width == 0 {
        return 1.0;
    }
    (max_width as f64 / native_width as f64).min(1.0)
}

/// Output size for a `width` x `height` frame, rounded to whole pixels
pub fn target_dimensions(width: u32, height: u32, max_width: u32) -> (u32, u32) {
    let scale = scale_factor(width, max_width);
    let w = ((width as f64 * scale).round() as u32).clamp(1, width.max(1));
    let h = ((height as f64 * scale).round() as u32).clamp(1, height.max(1));
    (w, h)
}

/// A captured view, encoded and ready to store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedImage {
    /// `data:image/jpeg;base64,...`
    pub data_uri: String,
    pub width: u32,
    pub height: u32,
}

impl EncodedImage {
    /// Wrap an already encoded data URI (e.g. one read back from storage)
    pub fn from_data_uri(data_uri: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            data_uri: data_uri.into(),
            width,
            height,
        }
    }

    /// Decoded JPEG bytes, if the payload is a base64 JPEG data URI
    pub fn jpeg_bytes(&self) -> Option<Vec<u8>> {
        let b64 = self.data_uri.strip_prefix(DATA_URI_PREFIX)?;
        base64::engine::general_purpose::STANDARD.decode(b64).ok()
    }
}

/// Frame to data URI encoder
#[derive(Debug, Clone, Default)]
pub struct ImageEncoder {
    config: EncoderConfig,
}

impl ImageEncoder {
    /// Create an encoder
    pub fn new(config: EncoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Downscale `frame` to the configured width cap and encode as JPEG
    pub fn encode(&self, frame: &VideoFrame) -> Result<EncodedImage, EncodeError> {
        if !frame.is_ready() {
            return Err(if frame.width == 0 || frame.height == 0 {
                EncodeError::NotReady {
                    width: frame.width,
                    height: frame.height,
                }
            } else {
                EncodeError::BufferSize {
                    expected: frame.expected_len(),
                    actual: frame.data.len(),
                }
            });
        }

        let source = RgbImage::from_raw(frame.width, frame.height, frame.data.clone()).ok_or(
            EncodeError::BufferSize {
                expected: frame.expected_len(),
                actual: frame.data.len(),
            },
        )?;

        let (width, height) = target_dimensions(frame.width, frame.height, self.config.max_width);
        let scaled = if (width, height) == (frame.width, frame.height) {
            source
        } else {
            image::imageops::resize(&source, width, height, FilterType::Triangle)
        };

        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, self.config.jpeg_quality).encode_image(&scaled)?;

        debug!(
            "Encoded frame {}: {}x{} -> {}x{}, {} bytes",
            frame.sequence,
            frame.width,
            frame.height,
            width,
            height,
            jpeg.len()
        );

        let b64 = base64::engine::general_purpose::STANDARD.encode(&jpeg);
        Ok(EncodedImage {
            data_uri: format!("{DATA_URI_PREFIX}{b64}"),
            width,
            height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn gradient(width: u32, height: u32) -> VideoFrame {
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&[(x % 256) as u8, (y % 256) as u8, 128]);
            }
        }
        VideoFrame::new(data, width, height, 0, 0)
    }

    #[test]
    fn test_scale_factor() {
        assert_eq!(scale_factor(1440, 720), 0.5);
        assert_eq!(scale_factor(720, 720), 1.0);
        assert_eq!(scale_factor(320, 720), 1.0);
    }

    #[test]
    fn test_full_hd_target() {
        assert_eq!(target_dimensions(1920, 1080, 720), (720, 405));
        assert_eq!(target_dimensions(640, 480, 720), (640, 480));
    }

    #[test]
    fn test_encode_downscales() {
        let encoder = ImageEncoder::default();
        let image = encoder.encode(&gradient(1440, 960)).unwrap();

        assert_eq!((image.width, image.height), (720, 480));
        assert!(image.data_uri.starts_with("data:image/jpeg;base64,"));

        let decoded = image::load_from_memory(&image.jpeg_bytes().unwrap()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (720, 480));
    }

    #[test]
    fn test_encode_keeps_small_frames() {
        let encoder = ImageEncoder::default();
        let image = encoder.encode(&gradient(64, 48)).unwrap();
        assert_eq!((image.width, image.height), (64, 48));
    }

    #[test]
    fn test_encode_is_deterministic() {
        let encoder = ImageEncoder::default();
        let frame = gradient(800, 600);
        assert_eq!(encoder.encode(&frame).unwrap(), encoder.encode(&frame).unwrap());
    }

    #[test]
    fn test_empty_frame_rejected() {
        let encoder = ImageEncoder::default();
        let err = encoder.encode(&VideoFrame::new(Vec::new(), 0, 0, 0, 0)).unwrap_err();
        assert!(matches!(err, EncodeError::NotReady { .. }));
    }

    #[test]
    fn test_truncated_frame_rejected() {
        let encoder = ImageEncoder::default();
        let err = encoder.encode(&VideoFrame::new(vec![0; 5], 2, 2, 0, 0)).unwrap_err();
        assert!(matches!(err, EncodeError::BufferSize { expected: 12, actual: 5 }));
    }

    proptest! {
        #[test]
        fn prop_width_capped_and_aspect_kept(width in 1u32..8000, height in 1u32..8000) {
            let (w, h) = target_dimensions(width, height, 720);
            prop_assert!(w <= 720);
            prop_assert!(w >= 1 && h >= 1);
            prop_assert!(w <= width && h <= height);

            // Within one pixel of the exact scaled height
            let exact = height as f64 * scale_factor(width, 720);
            prop_assert!((h as f64 - exact).abs() <= 1.0);
        }
    }
}
