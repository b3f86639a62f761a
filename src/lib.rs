//! posemark
//!
//! Pose-landmark video annotator: reads a video, runs a 33-point pose
//! landmarker on every frame, overlays the skeleton, and re-encodes the
//! annotated video at the source rate and resolution.
//!
//! # Architecture
//!
//! Data flow is strictly linear per frame, on one thread:
//!
//! Frame Source → Landmarker → Overlay Renderer → Video Sink
//!
//! The landmarker is an opaque oracle behind the [`LandmarkerBackend`] trait,
//! so the pipeline runs and tests against a stub returning canned results.
//! Per-frame detection failures are absorbed (the frame is written without an
//! overlay); only I/O failures abort a run.
//!
//! # Module Structure
//!
//! - `ingest`: frame sources (FFmpeg decode, synthetic stub streams)
//! - `detect`: landmarker backends, 33-point topology, accuracy metrics
//! - `overlay`: skeleton rendering onto frame copies
//! - `encode`: video sinks (FFmpeg H.264 encode, in-memory stub)
//! - `pipeline`: the per-frame controller and its report
//! - `config`, `scratch`: runtime configuration and temp-file lifecycle

use thiserror::Error;

pub mod config;
pub mod detect;
pub mod encode;
pub mod frame;
pub mod ingest;
pub mod overlay;
pub mod pipeline;
pub mod scratch;

pub use config::PosemarkConfig;
pub use detect::{
    DetectionResult, Landmark, LandmarkerBackend, LandmarkerRegistry, Pose, PoseIndex,
    SegmentationMask, StubLandmarker, POSE_CONNECTIONS, POSE_LANDMARK_COUNT,
};
#[cfg(feature = "backend-tract")]
pub use detect::TractLandmarker;
pub use encode::{SinkConfig, VideoSink};
pub use frame::Frame;
pub use ingest::{FrameSource, SourceConfig, SourceStats, StubStreamSettings};
pub use overlay::{OverlayRenderer, OverlayStyle};
pub use pipeline::{
    CancelToken, Pipeline, PipelineConfig, PipelineState, ProcessingReport,
};
pub use scratch::ScratchDir;

/// Recoverable per-frame failure.
///
/// Both variants are absorbed by the pipeline: the failure counter is
/// incremented and the frame is written without an overlay. Fatal I/O
/// failures use `anyhow::Error` instead.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The detection output violated the landmarker contract (wrong landmark
    /// count, out-of-range coordinates, mismatched mask shape).
    #[error("malformed detection: {0}")]
    Data(String),
    /// The landmarker itself failed on this frame.
    #[error("landmarker failed: {0}")]
    Oracle(String),
}
