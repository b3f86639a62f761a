use anyhow::Result;

use crate::detect::backend::LandmarkerBackend;
use crate::detect::landmarks::POSE_LANDMARK_COUNT;
use crate::detect::result::{DetectionResult, Landmark, Pose, SegmentationMask};

/// Normalized (x, y) for a canned standing figure, in anatomical order.
/// Head at the top of the frame, feet near the bottom.
const CANNED_POSE_XY: [(f32, f32); POSE_LANDMARK_COUNT] = [
    (0.50, 0.12), // nose
    (0.52, 0.10), // left eye inner
    (0.53, 0.10), // left eye
    (0.54, 0.10), // left eye outer
    (0.48, 0.10), // right eye inner
    (0.47, 0.10), // right eye
    (0.46, 0.10), // right eye outer
    (0.56, 0.11), // left ear
    (0.44, 0.11), // right ear
    (0.52, 0.14), // mouth left
    (0.48, 0.14), // mouth right
    (0.60, 0.25), // left shoulder
    (0.40, 0.25), // right shoulder
    (0.64, 0.38), // left elbow
    (0.36, 0.38), // right elbow
    (0.66, 0.50), // left wrist
    (0.34, 0.50), // right wrist
    (0.675, 0.54), // left pinky
    (0.325, 0.54), // right pinky
    (0.665, 0.545), // left index
    (0.335, 0.545), // right index
    (0.655, 0.53), // left thumb
    (0.345, 0.53), // right thumb
    (0.56, 0.52), // left hip
    (0.44, 0.52), // right hip
    (0.57, 0.68), // left knee
    (0.43, 0.68), // right knee
    (0.58, 0.84), // left ankle
    (0.42, 0.84), // right ankle
    (0.585, 0.88), // left heel
    (0.415, 0.88), // right heel
    (0.60, 0.90), // left foot index
    (0.40, 0.90), // right foot index
];

/// Stub landmarker for tests and dry runs. Returns canned results,
/// bit-identical on every call.
pub struct StubLandmarker {
    pose: Option<Pose>,
    with_mask: bool,
}

impl StubLandmarker {
    /// A landmarker that never sees a person.
    pub fn empty() -> Self {
        Self {
            pose: None,
            with_mask: false,
        }
    }

    /// A landmarker that reports the given pose on every frame.
    pub fn with_pose(pose: Pose) -> Self {
        Self {
            pose: Some(pose),
            with_mask: false,
        }
    }

    /// Also emit a frame-sized segmentation mask with each detection.
    pub fn with_mask(mut self) -> Self {
        self.with_mask = true;
        self
    }

    /// A full 33-landmark standing figure, all landmarks visible.
    pub fn canned_pose() -> Pose {
        let landmarks = CANNED_POSE_XY
            .iter()
            .map(|&(x, y)| Landmark {
                x,
                y,
                z: 0.0,
                visibility: 0.98,
                presence: 0.99,
            })
            .collect();
        Pose { landmarks }
    }
}

impl LandmarkerBackend for StubLandmarker {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn detect(&mut self, _pixels: &[u8], width: u32, height: u32) -> Result<DetectionResult> {
        let Some(pose) = &self.pose else {
            return Ok(DetectionResult::none());
        };
        let mask = if self.with_mask {
            let data = vec![0.0f32; width as usize * height as usize];
            Some(SegmentationMask::new(width, height, data)?)
        } else {
            None
        };
        Ok(DetectionResult {
            poses: vec![pose.clone()],
            mask,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canned_pose_satisfies_the_contract() {
        let result = DetectionResult {
            poses: vec![StubLandmarker::canned_pose()],
            mask: None,
        };
        assert!(result.validate(640, 480).is_ok());
    }

    #[test]
    fn repeated_calls_are_identical() {
        let mut backend = StubLandmarker::with_pose(StubLandmarker::canned_pose());
        let pixels = vec![0u8; 64 * 48 * 3];
        let r1 = backend.detect(&pixels, 64, 48).unwrap();
        let r2 = backend.detect(&pixels, 64, 48).unwrap();
        let p1 = &r1.poses[0].landmarks;
        let p2 = &r2.poses[0].landmarks;
        for (a, b) in p1.iter().zip(p2.iter()) {
            assert!((a.x - b.x).abs() < 1e-6);
            assert!((a.y - b.y).abs() < 1e-6);
        }
    }

    #[test]
    fn empty_backend_reports_no_person() {
        let mut backend = StubLandmarker::empty();
        let result = backend.detect(&[0u8; 12], 2, 2).unwrap();
        assert!(!result.has_pose());
        assert!(result.mask.is_none());
    }

    #[test]
    fn mask_matches_frame_dimensions() {
        let mut backend =
            StubLandmarker::with_pose(StubLandmarker::canned_pose()).with_mask();
        let result = backend.detect(&vec![0u8; 20 * 10 * 3], 20, 10).unwrap();
        let mask = result.mask.expect("mask");
        assert_eq!((mask.width(), mask.height()), (20, 10));
    }
}
