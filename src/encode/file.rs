//! Local file video sink.
//!
//! `VideoSink` encodes frames into a local container. `stub://` paths select
//! an in-memory sink for tests; anything else requires the video-ffmpeg
//! feature.

use anyhow::{anyhow, Result};

use crate::frame::Frame;
#[cfg(feature = "video-ffmpeg")]
use super::file_ffmpeg::FfmpegVideoSink;

/// Configuration for a video sink.
#[derive(Clone, Debug)]
pub struct SinkConfig {
    /// Destination path, or `stub://<name>` for an in-memory sink.
    pub path: String,
    pub width: u32,
    pub height: u32,
    /// Output frame rate, normally the source's.
    pub fps: f64,
}

/// Local video sink.
pub struct VideoSink {
    backend: SinkBackend,
    finished: bool,
}

enum SinkBackend {
    Synthetic(StubVideoSink),
    #[cfg(feature = "video-ffmpeg")]
    Ffmpeg(FfmpegVideoSink),
}

impl VideoSink {
    /// Open a destination for writing. Fails on a non-local path, zero
    /// dimensions/rate, or an unwritable destination.
    pub fn open(config: SinkConfig) -> Result<Self> {
        if !is_local_file_path(&config.path) {
            return Err(anyhow!(
                "video sink only supports local paths (no URL schemes)"
            ));
        }
        if config.width == 0 || config.height == 0 {
            return Err(anyhow!("video sink dimensions must be non-zero"));
        }
        if config.fps <= 0.0 {
            return Err(anyhow!("video sink frame rate must be positive"));
        }
        if config.path.starts_with("stub://") {
            Ok(Self {
                backend: SinkBackend::Synthetic(StubVideoSink::new(config)),
                finished: false,
            })
        } else {
            #[cfg(feature = "video-ffmpeg")]
            {
                Ok(Self {
                    backend: SinkBackend::Ffmpeg(FfmpegVideoSink::open(config)?),
                    finished: false,
                })
            }
            #[cfg(not(feature = "video-ffmpeg"))]
            {
                Err(anyhow!(
                    "writing video files requires the video-ffmpeg feature"
                ))
            }
        }
    }

    /// Encode and queue one frame. Frames must match the configured
    /// dimensions and are written in call order.
    pub fn write(&mut self, frame: &Frame) -> Result<()> {
        if self.finished {
            return Err(anyhow!("video sink is already finished"));
        }
        match &mut self.backend {
            SinkBackend::Synthetic(sink) => sink.write(frame),
            #[cfg(feature = "video-ffmpeg")]
            SinkBackend::Ffmpeg(sink) => sink.write(frame),
        }
    }

    /// Flush the encoder and close the container. Returns frames written.
    pub fn finish(&mut self) -> Result<u64> {
        if self.finished {
            return Ok(self.frames_written());
        }
        self.finished = true;
        match &mut self.backend {
            SinkBackend::Synthetic(sink) => Ok(sink.frames.len() as u64),
            #[cfg(feature = "video-ffmpeg")]
            SinkBackend::Ffmpeg(sink) => sink.finish(),
        }
    }

    /// Frames accepted so far.
    pub fn frames_written(&self) -> u64 {
        match &self.backend {
            SinkBackend::Synthetic(sink) => sink.frames.len() as u64,
            #[cfg(feature = "video-ffmpeg")]
            SinkBackend::Ffmpeg(sink) => sink.frames_written(),
        }
    }

    /// Frames captured by a `stub://` sink, in write order. `None` for real
    /// file sinks.
    pub fn stub_frames(&self) -> Option<&[Frame]> {
        match &self.backend {
            SinkBackend::Synthetic(sink) => Some(&sink.frames),
            #[cfg(feature = "video-ffmpeg")]
            SinkBackend::Ffmpeg(_) => None,
        }
    }
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

// ----------------------------------------------------------------------------
// In-memory sink (stub://) for tests
// ----------------------------------------------------------------------------

struct StubVideoSink {
    config: SinkConfig,
    frames: Vec<Frame>,
}

impl StubVideoSink {
    fn new(config: SinkConfig) -> Self {
        log::info!("VideoSink: {} (synthetic)", config.path);
        Self {
            config,
            frames: Vec::new(),
        }
    }

    fn write(&mut self, frame: &Frame) -> Result<()> {
        if frame.width() != self.config.width || frame.height() != self.config.height {
            return Err(anyhow!(
                "frame is {}x{}, sink expects {}x{}",
                frame.width(),
                frame.height(),
                self.config.width,
                self.config.height
            ));
        }
        self.frames.push(frame.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::BYTES_PER_PIXEL;

    fn frame(index: u64) -> Frame {
        Frame::new(vec![0u8; 4 * 4 * BYTES_PER_PIXEL], 4, 4, index, 0).unwrap()
    }

    fn stub_sink() -> VideoSink {
        VideoSink::open(SinkConfig {
            path: "stub://out".to_string(),
            width: 4,
            height: 4,
            fps: 30.0,
        })
        .unwrap()
    }

    #[test]
    fn preserves_write_order() {
        let mut sink = stub_sink();
        for i in 0..5 {
            sink.write(&frame(i)).unwrap();
        }
        assert_eq!(sink.finish().unwrap(), 5);
        let indices: Vec<u64> = sink
            .stub_frames()
            .unwrap()
            .iter()
            .map(Frame::index)
            .collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn rejects_mismatched_dimensions() {
        let mut sink = stub_sink();
        let wrong = Frame::new(vec![0u8; 8 * 8 * BYTES_PER_PIXEL], 8, 8, 0, 0).unwrap();
        assert!(sink.write(&wrong).is_err());
    }

    #[test]
    fn write_after_finish_is_an_error() {
        let mut sink = stub_sink();
        sink.write(&frame(0)).unwrap();
        sink.finish().unwrap();
        assert!(sink.write(&frame(1)).is_err());
        // finish is idempotent
        assert_eq!(sink.finish().unwrap(), 1);
    }

    #[test]
    fn rejects_invalid_configs() {
        assert!(VideoSink::open(SinkConfig {
            path: "http://remote/out.mp4".to_string(),
            width: 4,
            height: 4,
            fps: 30.0,
        })
        .is_err());
        assert!(VideoSink::open(SinkConfig {
            path: "stub://out".to_string(),
            width: 0,
            height: 4,
            fps: 30.0,
        })
        .is_err());
        assert!(VideoSink::open(SinkConfig {
            path: "stub://out".to_string(),
            width: 4,
            height: 4,
            fps: 0.0,
        })
        .is_err());
    }
}
