use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::SystemTime;

/// Pixel format of a captured video frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameFormat {
    /// 8-bit grayscale, one byte per pixel
    Luma8,
    /// RGB24 format - uncompressed RGB data
    Rgb24,
    /// Motion JPEG format - compressed JPEG frames
    Mjpeg,
}

impl FrameFormat {
    /// Get bytes per pixel for the format
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            FrameFormat::Luma8 => 1,
            FrameFormat::Rgb24 => 3,
            FrameFormat::Mjpeg => 0, // Variable size, compressed
        }
    }

    /// Check if format is compressed
    pub fn is_compressed(&self) -> bool {
        matches!(self, FrameFormat::Mjpeg)
    }
}

/// A single video frame handed to the detector
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// Unique frame identifier
    pub id: u64,
    /// Timestamp when the frame was captured
    pub timestamp: SystemTime,
    /// Raw pixel data (shared ownership for efficiency)
    pub data: Arc<Vec<u8>>,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Pixel format
    pub format: FrameFormat,
}

impl VideoFrame {
    pub fn new(
        id: u64,
        timestamp: SystemTime,
        data: Vec<u8>,
        width: u32,
        height: u32,
        format: FrameFormat,
    ) -> Self {
        Self {
            id,
            timestamp,
            data: Arc::new(data),
            width,
            height,
            format,
        }
    }

    /// Get the expected frame size for uncompressed formats
    pub fn expected_size(&self) -> Option<usize> {
        if self.format.is_compressed() {
            None
        } else {
            Some(self.width as usize * self.height as usize * self.format.bytes_per_pixel())
        }
    }

    /// Validate frame data size against expected size
    pub fn validate_size(&self) -> bool {
        match self.expected_size() {
            Some(expected) => self.data.len() == expected,
            None => true, // Compressed formats have variable size
        }
    }

    /// Get frame age in milliseconds
    pub fn age_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(self.timestamp)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_size_uncompressed() {
        let frame = VideoFrame::new(
            0,
            SystemTime::now(),
            vec![0u8; 64 * 48],
            64,
            48,
            FrameFormat::Luma8,
        );
        assert_eq!(frame.expected_size(), Some(64 * 48));
        assert!(frame.validate_size());
    }

    #[test]
    fn test_compressed_size_is_variable() {
        let frame = VideoFrame::new(
            1,
            SystemTime::now(),
            vec![0xFF, 0xD8, 0xFF, 0xD9],
            640,
            480,
            FrameFormat::Mjpeg,
        );
        assert_eq!(frame.expected_size(), None);
        assert!(frame.validate_size());
    }

    #[test]
    fn test_size_mismatch_detected() {
        let frame = VideoFrame::new(
            2,
            SystemTime::now(),
            vec![0u8; 10],
            64,
            48,
            FrameFormat::Rgb24,
        );
        assert!(!frame.validate_size());
    }
}
