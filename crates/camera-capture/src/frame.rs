//! Video frame types

/// Decoded RGB video frame as read from a live stream
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// RGB pixel data (width * height * 3)
    pub data: Vec<u8>,
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Capture timestamp (nanoseconds since stream start)
    pub timestamp_ns: u64,
    /// Frame sequence number
    pub sequence: u32,
}

impl VideoFrame {
    /// Create a new video frame from raw RGB data
    pub fn new(data: Vec<u8>, width: u32, height: u32, timestamp_ns: u64, sequence: u32) -> Self {
        Self {
            data,
            width,
            height,
            timestamp_ns,
            sequence,
        }
    }

    /// Number of bytes an RGB frame of this size must carry
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }

    /// A frame is usable once it has non-zero dimensions and a full buffer
    pub fn is_ready(&self) -> bool {
        self.width > 0 && self.height > 0 && self.data.len() == self.expected_len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_frame() {
        let frame = VideoFrame::new(vec![0; 4 * 2 * 3], 4, 2, 0, 0);
        assert!(frame.is_ready());
        assert_eq!(frame.expected_len(), 24);
    }

    #[test]
    fn test_zero_sized_frame_not_ready() {
        let frame = VideoFrame::new(Vec::new(), 0, 0, 0, 0);
        assert!(!frame.is_ready());
    }

    #[test]
    fn test_short_buffer_not_ready() {
        let frame = VideoFrame::new(vec![0; 10], 4, 2, 0, 0);
        assert!(!frame.is_ready());
    }
}
