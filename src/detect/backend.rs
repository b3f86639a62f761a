use anyhow::Result;

use crate::detect::result::DetectionResult;

/// Pose landmarker backend trait.
///
/// The landmarker is an opaque oracle: the pipeline hands it one RGB24 frame
/// and receives zero-or-one 33-landmark sets back. Backends must be
/// deterministic for identical input pixels (repeated calls yield coordinates
/// within 1e-6), a property the pipeline's consistency tests rely on.
///
/// Implementations must treat the pixel slice as read-only and ephemeral:
/// no retention beyond the call, no disk writes, no network I/O.
pub trait LandmarkerBackend: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Run pose detection on a frame of packed RGB24 pixels.
    fn detect(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<DetectionResult>;

    /// Optional warm-up hook (model load, first-inference JIT).
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
