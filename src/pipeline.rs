//! Per-frame processing pipeline.
//!
//! Orchestrates Frame Source → Landmarker → Overlay Renderer → Video Sink,
//! one frame at a time on one thread. Per-frame landmarker and renderer
//! failures are absorbed (the frame is written without an overlay) so one bad
//! frame cannot lose the rest of the video; I/O failures while opening,
//! writing, or closing are fatal.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};

use crate::detect::LandmarkerBackend;
use crate::encode::{SinkConfig, VideoSink};
use crate::frame::Frame;
use crate::ingest::{FrameSource, SourceConfig, StubStreamSettings};
use crate::overlay::{OverlayRenderer, OverlayStyle};

/// Pipeline lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PipelineState {
    #[default]
    Idle,
    Opening,
    Streaming,
    Closing,
    Done,
    Failed,
}

/// Counters mutated once per frame, finalized at end of stream.
#[derive(Clone, Debug, Default)]
pub struct ProcessingReport {
    pub frames_read: u64,
    /// Frames where the landmarker saw at least one person.
    pub frames_detected: u64,
    pub frames_written: u64,
    /// Frames whose detection output violated the landmarker contract.
    pub data_failures: u64,
    /// Frames where the landmarker itself failed.
    pub oracle_failures: u64,
    /// True when the run was stopped by a cancel request.
    pub cancelled: bool,
    /// True iff at least one frame was written.
    pub success: bool,
}

impl ProcessingReport {
    /// One-line human-readable summary.
    pub fn summary(&self) -> String {
        format!(
            "{} frames read, {} with detections, {} written, {} frame failures{}",
            self.frames_read,
            self.frames_detected,
            self.frames_written,
            self.data_failures + self.oracle_failures,
            if self.cancelled { " (cancelled)" } else { "" }
        )
    }
}

/// Cooperative stop flag, checked between frames. There is no mid-frame
/// cancellation.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Pipeline configuration.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Input video path (`stub://` for a synthetic stream).
    pub input: String,
    /// Output video path (`stub://` for an in-memory sink).
    pub output: String,
    /// Synthetic stream shape, used only for `stub://` inputs.
    pub stub: StubStreamSettings,
    /// Overlay colors and thresholds.
    pub style: OverlayStyle,
}

/// Progress callback: (frames processed, total frames if known).
pub type ProgressFn = Box<dyn FnMut(u64, Option<u64>) + Send>;

/// Orchestrates one video run end to end.
pub struct Pipeline {
    config: PipelineConfig,
    landmarker: Arc<Mutex<dyn LandmarkerBackend>>,
    renderer: OverlayRenderer,
    cancel: CancelToken,
    progress: Option<ProgressFn>,
    state: PipelineState,
    // Retained after the run so callers can inspect a stub sink.
    sink: Option<VideoSink>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, landmarker: Arc<Mutex<dyn LandmarkerBackend>>) -> Self {
        let renderer = OverlayRenderer::new(config.style.clone());
        Self {
            config,
            landmarker,
            renderer,
            cancel: CancelToken::new(),
            progress: None,
            state: PipelineState::Idle,
            sink: None,
        }
    }

    /// Install a cooperative cancellation token.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Install a per-frame progress callback.
    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// The sink from the last run. Only useful for `stub://` outputs.
    pub fn sink(&self) -> Option<&VideoSink> {
        self.sink.as_ref()
    }

    /// Process the whole video. Returns the report; `Err` means an
    /// unrecoverable I/O failure (the source and sink are still released).
    pub fn run(&mut self) -> Result<ProcessingReport> {
        let mut report = ProcessingReport::default();

        self.state = PipelineState::Opening;
        let mut source = match FrameSource::open(SourceConfig {
            path: self.config.input.clone(),
            stub: self.config.stub.clone(),
        }) {
            Ok(source) => source,
            Err(e) => {
                self.state = PipelineState::Failed;
                return Err(e).with_context(|| format!("open input '{}'", self.config.input));
            }
        };

        let (width, height) = source.dimensions();
        let fps = source.frame_rate();
        let total = source.frame_count();
        let mut sink = match VideoSink::open(SinkConfig {
            path: self.config.output.clone(),
            width,
            height,
            fps: if fps > 0.0 { fps } else { 30.0 },
        }) {
            Ok(sink) => sink,
            Err(e) => {
                self.state = PipelineState::Failed;
                return Err(e).with_context(|| format!("open output '{}'", self.config.output));
            }
        };

        self.state = PipelineState::Streaming;
        log::info!(
            "pipeline streaming: {} -> {} ({}x{} @ {:.2} fps)",
            self.config.input,
            self.config.output,
            width,
            height,
            fps
        );

        loop {
            if self.cancel.is_cancelled() {
                log::warn!("cancel requested, closing after {} frames", report.frames_read);
                report.cancelled = true;
                break;
            }

            let frame = match source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(e) => {
                    self.state = PipelineState::Failed;
                    // Source and sink close via drop on this exit path.
                    return Err(e).context("read frame from input");
                }
            };
            report.frames_read += 1;

            let annotated = match self.annotate(&frame, &mut report) {
                Ok(annotated) => annotated,
                Err(e) => {
                    self.state = PipelineState::Failed;
                    return Err(e);
                }
            };
            if let Err(e) = sink.write(&annotated) {
                self.state = PipelineState::Failed;
                return Err(e).context("write frame to output");
            }

            if let Some(progress) = &mut self.progress {
                progress(report.frames_read, total);
            }
        }

        self.state = PipelineState::Closing;
        match sink.finish() {
            Ok(written) => report.frames_written = written,
            Err(e) => {
                self.state = PipelineState::Failed;
                return Err(e).context("finalize output");
            }
        }
        drop(source);
        self.sink = Some(sink);

        report.success = report.frames_written > 0;
        self.state = PipelineState::Done;
        log::info!("pipeline done: {}", report.summary());
        Ok(report)
    }

    /// Run the landmarker and renderer on one frame. Per-frame failures fall
    /// back to the unannotated frame; only lock poisoning is fatal.
    fn annotate(&mut self, frame: &Frame, report: &mut ProcessingReport) -> Result<Frame> {
        let detection = {
            let mut landmarker = self
                .landmarker
                .lock()
                .map_err(|_| anyhow!("landmarker lock poisoned"))?;
            landmarker.detect(frame.pixels(), frame.width(), frame.height())
        };

        let detection = match detection {
            Ok(detection) => detection,
            Err(e) => {
                report.oracle_failures += 1;
                log::warn!("frame {}: landmarker failed: {}", frame.index(), e);
                return Ok(frame.clone());
            }
        };

        if let Err(e) = detection.validate(frame.width(), frame.height()) {
            report.data_failures += 1;
            log::warn!("frame {}: {}", frame.index(), e);
            return Ok(frame.clone());
        }

        match self.renderer.render(frame, &detection) {
            Ok(annotated) => {
                if detection.has_pose() {
                    report.frames_detected += 1;
                }
                Ok(annotated)
            }
            Err(e) => {
                report.data_failures += 1;
                log::warn!("frame {}: overlay failed: {}", frame.index(), e);
                Ok(frame.clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::StubLandmarker;

    fn stub_pipeline(frames: u64, landmarker: Arc<Mutex<dyn LandmarkerBackend>>) -> Pipeline {
        Pipeline::new(
            PipelineConfig {
                input: "stub://in".to_string(),
                output: "stub://out".to_string(),
                stub: StubStreamSettings {
                    frames,
                    width: 32,
                    height: 24,
                    fps: 30.0,
                },
                style: OverlayStyle::default(),
            },
            landmarker,
        )
    }

    #[test]
    fn state_walks_idle_to_done() {
        let mut pipeline = stub_pipeline(2, Arc::new(Mutex::new(StubLandmarker::empty())));
        assert_eq!(pipeline.state(), PipelineState::Idle);
        let report = pipeline.run().unwrap();
        assert_eq!(pipeline.state(), PipelineState::Done);
        assert!(report.success);
    }

    #[test]
    fn open_failure_fails_the_pipeline() {
        let mut pipeline = Pipeline::new(
            PipelineConfig {
                input: "rtsp://not/local".to_string(),
                output: "stub://out".to_string(),
                stub: StubStreamSettings::default(),
                style: OverlayStyle::default(),
            },
            Arc::new(Mutex::new(StubLandmarker::empty())),
        );
        assert!(pipeline.run().is_err());
        assert_eq!(pipeline.state(), PipelineState::Failed);
    }

    #[test]
    fn progress_reports_every_frame() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_in_cb = seen.clone();
        let mut pipeline = stub_pipeline(4, Arc::new(Mutex::new(StubLandmarker::empty())))
            .with_progress(Box::new(move |done, total| {
                seen_in_cb.lock().unwrap().push((done, total));
            }));
        pipeline.run().unwrap();
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 4);
        assert_eq!(seen[3], (4, Some(4)));
    }

    #[test]
    fn cancelled_run_closes_cleanly() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let mut pipeline = stub_pipeline(10, Arc::new(Mutex::new(StubLandmarker::empty())))
            .with_cancel(cancel);
        let report = pipeline.run().unwrap();
        assert!(report.cancelled);
        assert_eq!(report.frames_read, 0);
        assert!(!report.success);
        assert_eq!(pipeline.state(), PipelineState::Done);
    }
}
