//! Frame sources.
//!
//! This module yields decoded frames from a video container:
//! - Local video files via FFmpeg (feature: video-ffmpeg)
//! - Synthetic `stub://` streams (testing, no system FFmpeg required)
//!
//! Sources produce `Frame` instances in stream order, report the container's
//! frame rate and (when the container knows it) total frame count, and hold
//! the demuxer/decoder until dropped so release is scoped to the pipeline run.

pub mod file;
#[cfg(feature = "video-ffmpeg")]
pub(crate) mod file_ffmpeg;

pub use file::{FrameSource, SourceConfig, SourceStats, StubStreamSettings};
