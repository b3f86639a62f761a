use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::ingest::StubStreamSettings;
use crate::overlay::OverlayStyle;

const DEFAULT_BACKEND: &str = "stub";
const DEFAULT_MODEL_INPUT_SIZE: u32 = 256;
const DEFAULT_VISIBILITY_THRESHOLD: f32 = 0.5;
const DEFAULT_MARKER_RADIUS: i32 = 3;
const DEFAULT_STUB_FRAMES: u64 = 10;
const DEFAULT_STUB_FPS: f64 = 30.0;
const DEFAULT_STUB_WIDTH: u32 = 640;
const DEFAULT_STUB_HEIGHT: u32 = 480;

#[derive(Debug, Deserialize, Default)]
struct PosemarkConfigFile {
    backend: Option<String>,
    model: Option<ModelConfigFile>,
    overlay: Option<OverlayConfigFile>,
    stub: Option<StubConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct ModelConfigFile {
    path: Option<PathBuf>,
    input_size: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct OverlayConfigFile {
    visibility_threshold: Option<f32>,
    marker_radius: Option<i32>,
}

#[derive(Debug, Deserialize, Default)]
struct StubConfigFile {
    frames: Option<u64>,
    width: Option<u32>,
    height: Option<u32>,
    fps: Option<f64>,
}

/// Resolved configuration: file defaults overridden by environment.
#[derive(Debug, Clone)]
pub struct PosemarkConfig {
    /// Landmarker backend name ("stub", "tract").
    pub backend: String,
    /// ONNX model path for the tract backend.
    pub model_path: Option<PathBuf>,
    /// Square model input edge in pixels.
    pub model_input_size: u32,
    pub visibility_threshold: f32,
    pub marker_radius: i32,
    pub stub: StubStreamSettings,
}

impl PosemarkConfig {
    /// Load from the JSON file named by `POSEMARK_CONFIG` (when set), then
    /// apply environment overrides and validate.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("POSEMARK_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Overlay style derived from this configuration.
    pub fn overlay_style(&self) -> OverlayStyle {
        OverlayStyle {
            visibility_threshold: self.visibility_threshold,
            marker_radius: self.marker_radius,
            ..OverlayStyle::default()
        }
    }

    fn from_file(file: PosemarkConfigFile) -> Self {
        let backend = file.backend.unwrap_or_else(|| DEFAULT_BACKEND.to_string());
        let model_path = file.model.as_ref().and_then(|m| m.path.clone());
        let model_input_size = file
            .model
            .as_ref()
            .and_then(|m| m.input_size)
            .unwrap_or(DEFAULT_MODEL_INPUT_SIZE);
        let visibility_threshold = file
            .overlay
            .as_ref()
            .and_then(|o| o.visibility_threshold)
            .unwrap_or(DEFAULT_VISIBILITY_THRESHOLD);
        let marker_radius = file
            .overlay
            .as_ref()
            .and_then(|o| o.marker_radius)
            .unwrap_or(DEFAULT_MARKER_RADIUS);
        let stub = StubStreamSettings {
            frames: file
                .stub
                .as_ref()
                .and_then(|s| s.frames)
                .unwrap_or(DEFAULT_STUB_FRAMES),
            width: file
                .stub
                .as_ref()
                .and_then(|s| s.width)
                .unwrap_or(DEFAULT_STUB_WIDTH),
            height: file
                .stub
                .as_ref()
                .and_then(|s| s.height)
                .unwrap_or(DEFAULT_STUB_HEIGHT),
            fps: file
                .stub
                .as_ref()
                .and_then(|s| s.fps)
                .unwrap_or(DEFAULT_STUB_FPS),
        };
        Self {
            backend,
            model_path,
            model_input_size,
            visibility_threshold,
            marker_radius,
            stub,
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(backend) = std::env::var("POSEMARK_BACKEND") {
            if !backend.trim().is_empty() {
                self.backend = backend;
            }
        }
        if let Ok(path) = std::env::var("POSEMARK_MODEL_PATH") {
            if !path.trim().is_empty() {
                self.model_path = Some(PathBuf::from(path));
            }
        }
        if let Ok(threshold) = std::env::var("POSEMARK_VISIBILITY_THRESHOLD") {
            self.visibility_threshold = threshold.parse().map_err(|_| {
                anyhow!("POSEMARK_VISIBILITY_THRESHOLD must be a number in [0, 1]")
            })?;
        }
        if let Ok(frames) = std::env::var("POSEMARK_STUB_FRAMES") {
            self.stub.frames = frames
                .parse()
                .map_err(|_| anyhow!("POSEMARK_STUB_FRAMES must be an integer"))?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.backend.trim().is_empty() {
            return Err(anyhow!("backend name must not be empty"));
        }
        if !(0.0..=1.0).contains(&self.visibility_threshold) {
            return Err(anyhow!("visibility threshold must be within [0, 1]"));
        }
        if self.marker_radius < 0 {
            return Err(anyhow!("marker radius must not be negative"));
        }
        if self.model_input_size == 0 {
            return Err(anyhow!("model input size must be non-zero"));
        }
        if self.backend == "tract" && self.model_path.is_none() {
            return Err(anyhow!("the tract backend requires a model path"));
        }
        if self.stub.frames == 0 || self.stub.width == 0 || self.stub.height == 0 {
            return Err(anyhow!("stub stream shape must be non-zero"));
        }
        if self.stub.fps <= 0.0 {
            return Err(anyhow!("stub frame rate must be positive"));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<PosemarkConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
