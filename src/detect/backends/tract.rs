#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tract_onnx::prelude::*;

use crate::detect::backend::LandmarkerBackend;
use crate::detect::landmarks::POSE_LANDMARK_COUNT;
use crate::detect::result::{DetectionResult, Landmark, Pose};

/// Values per landmark in the model output: x, y, z, visibility, presence.
const VALUES_PER_LANDMARK: usize = 5;

/// Tract-based pose landmarker running a local ONNX model.
///
/// The model is expected to take a square RGB input and emit a flat
/// `33 x 5` landmark tensor (coordinates in input pixels, score logits),
/// optionally followed by a scalar pose-presence score. This matches the
/// BlazePose landmark-model export layout.
///
/// No network I/O; disk access is limited to the one-time model load.
pub struct TractLandmarker {
    model: TypedSimplePlan<TypedModel>,
    input_size: u32,
    presence_threshold: f32,
}

impl TractLandmarker {
    /// Load an ONNX pose model from disk and prepare it for inference.
    ///
    /// `input_size` is the square model input edge in pixels (256 for the
    /// full BlazePose landmark model).
    pub fn new<P: AsRef<Path>>(model_path: P, input_size: u32) -> Result<Self> {
        let model_path = model_path.as_ref();
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(
                    f32::datum_type(),
                    tvec!(1, 3, input_size as usize, input_size as usize),
                ),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        Ok(Self {
            model,
            input_size,
            presence_threshold: 0.5,
        })
    }

    /// Override the default pose-presence threshold.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.presence_threshold = threshold;
        self
    }

    fn build_input(&self, pixels: &[u8], width: u32, height: u32) -> Result<Tensor> {
        let expected_len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| anyhow!("frame dimensions overflow"))?;
        if pixels.len() != expected_len {
            return Err(anyhow!(
                "expected {} RGB bytes, received {}",
                expected_len,
                pixels.len()
            ));
        }

        // Nearest-neighbor resample to the square model input.
        let size = self.input_size as usize;
        let src_w = width as usize;
        let src_h = height as usize;
        let input = tract_ndarray::Array4::from_shape_fn(
            (1, 3, size, size),
            |(_, channel, y, x)| {
                let sx = (x * src_w / size).min(src_w - 1);
                let sy = (y * src_h / size).min(src_h - 1);
                let idx = (sy * src_w + sx) * 3 + channel;
                pixels[idx] as f32 / 255.0
            },
        );

        Ok(input.into_tensor())
    }

    fn decode_landmarks(&self, outputs: &TVec<TValue>) -> Result<Pose> {
        let output = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let raw = output
            .to_array_view::<f32>()
            .context("model landmark tensor was not f32")?;
        let values: Vec<f32> = raw.iter().copied().collect();
        let expected = POSE_LANDMARK_COUNT * VALUES_PER_LANDMARK;
        if values.len() < expected {
            return Err(anyhow!(
                "model emitted {} landmark values, expected at least {}",
                values.len(),
                expected
            ));
        }

        let scale = self.input_size as f32;
        let landmarks = values
            .chunks_exact(VALUES_PER_LANDMARK)
            .take(POSE_LANDMARK_COUNT)
            .map(|chunk| Landmark {
                // Clamp to the normalized range the oracle contract promises.
                x: (chunk[0] / scale).clamp(0.0, 1.0),
                y: (chunk[1] / scale).clamp(0.0, 1.0),
                z: chunk[2] / scale,
                visibility: sigmoid(chunk[3]),
                presence: sigmoid(chunk[4]),
            })
            .collect();

        Ok(Pose { landmarks })
    }

    fn pose_presence(&self, outputs: &TVec<TValue>) -> Result<f32> {
        // Second output, when present, is a scalar pose-presence score.
        let Some(output) = outputs.get(1) else {
            return Ok(1.0);
        };
        let scores = output
            .to_array_view::<f32>()
            .context("model presence tensor was not f32")?;
        let score = scores
            .iter()
            .copied()
            .next()
            .ok_or_else(|| anyhow!("model presence output was empty"))?;
        // Exported models differ on whether this is a logit or a probability.
        if (0.0..=1.0).contains(&score) {
            Ok(score)
        } else {
            Ok(sigmoid(score))
        }
    }
}

impl LandmarkerBackend for TractLandmarker {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn detect(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<DetectionResult> {
        let input = self.build_input(pixels, width, height)?;
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;

        if self.pose_presence(&outputs)? < self.presence_threshold {
            return Ok(DetectionResult::none());
        }

        let pose = self.decode_landmarks(&outputs)?;
        Ok(DetectionResult {
            poses: vec![pose],
            mask: None,
        })
    }

    fn warm_up(&mut self) -> Result<()> {
        let size = self.input_size as usize;
        let blank = vec![0u8; size * size * 3];
        self.detect(&blank, self.input_size, self.input_size)
            .map(|_| ())
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}
