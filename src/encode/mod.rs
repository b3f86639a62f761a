//! Video sinks.
//!
//! Counterpart to `ingest`: encodes annotated frames back into a container at
//! the source frame rate and resolution. Frames are written in the exact
//! order they are handed in; the sink never reorders or drops.
//!
//! - FFmpeg H.264 encode (feature: video-ffmpeg)
//! - In-memory `stub://` sink (testing)

pub mod file;
#[cfg(feature = "video-ffmpeg")]
pub(crate) mod file_ffmpeg;

pub use file::{SinkConfig, VideoSink};
