//! Local file frame source.
//!
//! `FrameSource` reads a local video file and yields decoded RGB24 frames in
//! stream order. `stub://` paths select a synthetic generator so pipeline
//! tests run without FFmpeg; anything else requires the video-ffmpeg feature.

use anyhow::{anyhow, Result};

use crate::frame::{Frame, BYTES_PER_PIXEL};
#[cfg(feature = "video-ffmpeg")]
use super::file_ffmpeg::FfmpegFrameSource;

/// Configuration for a frame source.
#[derive(Clone, Debug)]
pub struct SourceConfig {
    /// Local file path, or `stub://<name>` for a synthetic stream.
    pub path: String,
    /// Settings for synthetic streams. Ignored for real files.
    pub stub: StubStreamSettings,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            stub: StubStreamSettings::default(),
        }
    }
}

/// Shape of a synthetic `stub://` stream.
#[derive(Clone, Debug)]
pub struct StubStreamSettings {
    pub frames: u64,
    pub width: u32,
    pub height: u32,
    pub fps: f64,
}

impl Default for StubStreamSettings {
    fn default() -> Self {
        Self {
            frames: 10,
            width: 640,
            height: 480,
            fps: 30.0,
        }
    }
}

/// Local video frame source.
pub struct FrameSource {
    backend: SourceBackend,
}

enum SourceBackend {
    Synthetic(SyntheticFrameSource),
    #[cfg(feature = "video-ffmpeg")]
    Ffmpeg(FfmpegFrameSource),
}

impl FrameSource {
    /// Open a video file for reading. Fails when the path is not local, the
    /// container cannot be opened, or it has no video track.
    pub fn open(config: SourceConfig) -> Result<Self> {
        if !is_local_file_path(&config.path) {
            return Err(anyhow!(
                "frame source only supports local paths (no URL schemes)"
            ));
        }
        if config.path.starts_with("stub://") {
            Ok(Self {
                backend: SourceBackend::Synthetic(SyntheticFrameSource::new(config)),
            })
        } else {
            #[cfg(feature = "video-ffmpeg")]
            {
                Ok(Self {
                    backend: SourceBackend::Ffmpeg(FfmpegFrameSource::open(config)?),
                })
            }
            #[cfg(not(feature = "video-ffmpeg"))]
            {
                Err(anyhow!(
                    "reading video files requires the video-ffmpeg feature"
                ))
            }
        }
    }

    /// Decode the next frame. `Ok(None)` at end of stream.
    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        match &mut self.backend {
            SourceBackend::Synthetic(source) => source.next_frame(),
            #[cfg(feature = "video-ffmpeg")]
            SourceBackend::Ffmpeg(source) => source.next_frame(),
        }
    }

    /// Total frame count from container metadata, when the container knows it.
    pub fn frame_count(&self) -> Option<u64> {
        match &self.backend {
            SourceBackend::Synthetic(source) => Some(source.config.stub.frames),
            #[cfg(feature = "video-ffmpeg")]
            SourceBackend::Ffmpeg(source) => source.frame_count(),
        }
    }

    /// Source frame rate in frames per second.
    pub fn frame_rate(&self) -> f64 {
        match &self.backend {
            SourceBackend::Synthetic(source) => source.config.stub.fps,
            #[cfg(feature = "video-ffmpeg")]
            SourceBackend::Ffmpeg(source) => source.frame_rate(),
        }
    }

    /// Frame dimensions (width, height).
    pub fn dimensions(&self) -> (u32, u32) {
        match &self.backend {
            SourceBackend::Synthetic(source) => {
                (source.config.stub.width, source.config.stub.height)
            }
            #[cfg(feature = "video-ffmpeg")]
            SourceBackend::Ffmpeg(source) => source.dimensions(),
        }
    }

    /// Read statistics.
    pub fn stats(&self) -> SourceStats {
        match &self.backend {
            SourceBackend::Synthetic(source) => source.stats(),
            #[cfg(feature = "video-ffmpeg")]
            SourceBackend::Ffmpeg(source) => source.stats(),
        }
    }
}

/// Statistics for a frame source.
#[derive(Clone, Debug)]
pub struct SourceStats {
    pub frames_read: u64,
    pub path: String,
}

// ----------------------------------------------------------------------------
// Synthetic source (stub://) for tests
// ----------------------------------------------------------------------------

struct SyntheticFrameSource {
    config: SourceConfig,
    frames_read: u64,
}

impl SyntheticFrameSource {
    fn new(config: SourceConfig) -> Self {
        log::info!("FrameSource: {} (synthetic)", config.path);
        Self {
            config,
            frames_read: 0,
        }
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let stub = &self.config.stub;
        if self.frames_read >= stub.frames {
            return Ok(None);
        }
        let index = self.frames_read;
        self.frames_read += 1;

        let pixels = generate_gradient_pixels(stub.width, stub.height, index);
        let timestamp_ms = if stub.fps > 0.0 {
            (index as f64 * 1000.0 / stub.fps) as i64
        } else {
            0
        };
        Ok(Some(Frame::new(
            pixels,
            stub.width,
            stub.height,
            index,
            timestamp_ms,
        )?))
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_read: self.frames_read,
            path: self.config.path.clone(),
        }
    }
}

/// Deterministic moving gradient. Contains no detectable person.
fn generate_gradient_pixels(width: u32, height: u32, index: u64) -> Vec<u8> {
    let pixel_count = width as usize * height as usize * BYTES_PER_PIXEL;
    let mut pixels = vec![0u8; pixel_count];
    for (i, pixel) in pixels.iter_mut().enumerate() {
        *pixel = ((i as u64 / 3 + index * 7) % 256) as u8;
    }
    pixels
}

fn is_local_file_path(path: &str) -> bool {
    if path.trim().is_empty() {
        return false;
    }
    if path.starts_with("stub://") {
        return true;
    }
    !path.contains("://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_source_yields_configured_frame_count() {
        let mut source = FrameSource::open(SourceConfig {
            path: "stub://dance".to_string(),
            stub: StubStreamSettings {
                frames: 3,
                width: 8,
                height: 6,
                fps: 30.0,
            },
        })
        .unwrap();

        assert_eq!(source.frame_count(), Some(3));
        assert_eq!(source.dimensions(), (8, 6));

        let mut indices = Vec::new();
        while let Some(frame) = source.next_frame().unwrap() {
            assert_eq!(frame.pixels().len(), 8 * 6 * 3);
            indices.push(frame.index());
        }
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(source.stats().frames_read, 3);
    }

    #[test]
    fn timestamps_follow_the_frame_rate() {
        let mut source = FrameSource::open(SourceConfig {
            path: "stub://clock".to_string(),
            stub: StubStreamSettings {
                frames: 2,
                width: 4,
                height: 4,
                fps: 25.0,
            },
        })
        .unwrap();
        let f0 = source.next_frame().unwrap().unwrap();
        let f1 = source.next_frame().unwrap().unwrap();
        assert_eq!(f0.timestamp_ms(), 0);
        assert_eq!(f1.timestamp_ms(), 40);
    }

    #[test]
    fn rejects_remote_urls() {
        let config = SourceConfig {
            path: "rtsp://camera/stream".to_string(),
            ..SourceConfig::default()
        };
        assert!(FrameSource::open(config).is_err());
    }

    #[test]
    fn rejects_empty_path() {
        assert!(FrameSource::open(SourceConfig::default()).is_err());
    }
}
