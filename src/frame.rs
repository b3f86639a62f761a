//! Raster frame type flowing through the pipeline.
//!
//! A `Frame` is one decoded video frame in packed RGB24, together with its
//! position in the stream. Frames are immutable once constructed: the overlay
//! renderer produces a new `Frame` rather than drawing into the original, so a
//! frame handed to another consumer (e.g. a live preview) is never written to
//! behind its back.

use anyhow::{anyhow, Result};

/// Bytes per pixel in packed RGB24.
pub const BYTES_PER_PIXEL: usize = 3;

/// One decoded video frame.
#[derive(Clone, Debug)]
pub struct Frame {
    /// Packed RGB24 rows, no padding between rows.
    data: Vec<u8>,
    width: u32,
    height: u32,
    /// Zero-based position in the stream.
    index: u64,
    /// Presentation timestamp in milliseconds.
    timestamp_ms: i64,
}

impl Frame {
    /// Create a frame from tightly packed RGB24 bytes.
    ///
    /// Fails when the byte length does not match `width * height * 3`.
    pub fn new(
        data: Vec<u8>,
        width: u32,
        height: u32,
        index: u64,
        timestamp_ms: i64,
    ) -> Result<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(BYTES_PER_PIXEL))
            .ok_or_else(|| anyhow!("frame dimensions {}x{} overflow", width, height))?;
        if data.len() != expected {
            return Err(anyhow!(
                "expected {} RGB bytes for {}x{}, received {}",
                expected,
                width,
                height,
                data.len()
            ));
        }
        Ok(Self {
            data,
            width,
            height,
            index,
            timestamp_ms,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn timestamp_ms(&self) -> i64 {
        self.timestamp_ms
    }

    /// Packed RGB24 pixel data, row-major.
    pub fn pixels(&self) -> &[u8] {
        &self.data
    }

    /// Consume the frame, returning the pixel buffer.
    pub fn into_pixels(self) -> Vec<u8> {
        self.data
    }

    /// Build a new frame at the same stream position with replaced pixels.
    ///
    /// Used by the overlay renderer, which draws into a copy.
    pub fn with_pixels(&self, data: Vec<u8>) -> Result<Self> {
        Self::new(data, self.width, self.height, self.index, self.timestamp_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_buffer_length() {
        assert!(Frame::new(vec![0u8; 10], 4, 4, 0, 0).is_err());
        assert!(Frame::new(vec![0u8; 4 * 4 * 3], 4, 4, 0, 0).is_ok());
    }

    #[test]
    fn with_pixels_keeps_stream_position() {
        let frame = Frame::new(vec![0u8; 2 * 2 * 3], 2, 2, 7, 233).unwrap();
        let copy = frame.with_pixels(vec![255u8; 2 * 2 * 3]).unwrap();
        assert_eq!(copy.index(), 7);
        assert_eq!(copy.timestamp_ms(), 233);
        assert_ne!(copy.pixels(), frame.pixels());
    }
}
