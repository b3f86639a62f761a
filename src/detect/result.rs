//! Landmarker output types.

use crate::detect::landmarks::POSE_LANDMARK_COUNT;
use crate::FrameError;

/// A single normalized anatomical keypoint.
#[derive(Clone, Copy, Debug, Default)]
pub struct Landmark {
    /// Normalized horizontal position, 0.0 = left edge, 1.0 = right edge.
    pub x: f32,
    /// Normalized vertical position, 0.0 = top edge, 1.0 = bottom edge.
    pub y: f32,
    /// Depth estimate relative to the hips, same scale as x.
    pub z: f32,
    /// Likelihood the landmark is visible (not occluded) in the frame.
    pub visibility: f32,
    /// Likelihood the landmark is present in the frame at all.
    pub presence: f32,
}

/// One detected person: exactly 33 landmarks in anatomical order.
#[derive(Clone, Debug, Default)]
pub struct Pose {
    pub landmarks: Vec<Landmark>,
}

/// Per-pixel foreground probability, matching the source frame dimensions.
#[derive(Clone, Debug)]
pub struct SegmentationMask {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl SegmentationMask {
    pub fn new(width: u32, height: u32, data: Vec<f32>) -> Result<Self, FrameError> {
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(FrameError::Data(format!(
                "mask has {} values, expected {} for {}x{}",
                data.len(),
                expected,
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Foreground probability at a pixel. Out-of-bounds reads return 0.0.
    pub fn at(&self, x: u32, y: u32) -> f32 {
        if x >= self.width || y >= self.height {
            return 0.0;
        }
        self.data[y as usize * self.width as usize + x as usize]
    }
}

/// Result of running the landmarker on one frame.
///
/// Produced fresh per frame and not retained across iterations.
#[derive(Clone, Debug, Default)]
pub struct DetectionResult {
    /// Detected people, each with a full 33-landmark set. Usually zero or one.
    pub poses: Vec<Pose>,
    /// Optional segmentation mask.
    pub mask: Option<SegmentationMask>,
}

impl DetectionResult {
    /// Empty result: no person in this frame.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn has_pose(&self) -> bool {
        !self.poses.is_empty()
    }

    pub fn primary_pose(&self) -> Option<&Pose> {
        self.poses.first()
    }

    /// Check the landmarker's output against its contract: 33 landmarks per
    /// pose, coordinates within [0,1], mask shape equal to the frame's.
    ///
    /// A violation is the detector's fault, not the pipeline's; the caller
    /// recovers by skipping the overlay for this frame.
    pub fn validate(&self, frame_width: u32, frame_height: u32) -> Result<(), FrameError> {
        for (pose_idx, pose) in self.poses.iter().enumerate() {
            if pose.landmarks.len() != POSE_LANDMARK_COUNT {
                return Err(FrameError::Data(format!(
                    "pose {} has {} landmarks, expected {}",
                    pose_idx,
                    pose.landmarks.len(),
                    POSE_LANDMARK_COUNT
                )));
            }
            for (lm_idx, lm) in pose.landmarks.iter().enumerate() {
                if !(0.0..=1.0).contains(&lm.x) || !(0.0..=1.0).contains(&lm.y) {
                    return Err(FrameError::Data(format!(
                        "landmark {} of pose {} is outside [0,1]: ({}, {})",
                        lm_idx, pose_idx, lm.x, lm.y
                    )));
                }
            }
        }
        if let Some(mask) = &self.mask {
            if mask.width() != frame_width || mask.height() != frame_height {
                return Err(FrameError::Data(format!(
                    "mask is {}x{}, frame is {}x{}",
                    mask.width(),
                    mask.height(),
                    frame_width,
                    frame_height
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_pose() -> Pose {
        Pose {
            landmarks: vec![
                Landmark {
                    x: 0.5,
                    y: 0.5,
                    z: 0.0,
                    visibility: 0.9,
                    presence: 0.9,
                };
                POSE_LANDMARK_COUNT
            ],
        }
    }

    #[test]
    fn empty_result_is_valid() {
        assert!(DetectionResult::none().validate(640, 480).is_ok());
        assert!(!DetectionResult::none().has_pose());
    }

    #[test]
    fn full_pose_is_valid() {
        let result = DetectionResult {
            poses: vec![full_pose()],
            mask: None,
        };
        assert!(result.validate(640, 480).is_ok());
    }

    #[test]
    fn short_pose_is_rejected() {
        let mut pose = full_pose();
        pose.landmarks.truncate(5);
        let result = DetectionResult {
            poses: vec![pose],
            mask: None,
        };
        assert!(matches!(
            result.validate(640, 480),
            Err(FrameError::Data(_))
        ));
    }

    #[test]
    fn out_of_range_coordinate_is_rejected() {
        let mut pose = full_pose();
        pose.landmarks[3].x = 1.2;
        let result = DetectionResult {
            poses: vec![pose],
            mask: None,
        };
        assert!(result.validate(640, 480).is_err());
    }

    #[test]
    fn mask_shape_must_match_frame() {
        let mask = SegmentationMask::new(320, 240, vec![0.0; 320 * 240]).unwrap();
        let result = DetectionResult {
            poses: vec![],
            mask: Some(mask),
        };
        assert!(result.validate(320, 240).is_ok());
        assert!(result.validate(640, 480).is_err());
    }

    #[test]
    fn mask_rejects_wrong_buffer_length() {
        assert!(SegmentationMask::new(10, 10, vec![0.0; 99]).is_err());
    }

    #[test]
    fn mask_out_of_bounds_reads_zero() {
        let mask = SegmentationMask::new(2, 2, vec![0.25, 0.5, 0.75, 1.0]).unwrap();
        assert_eq!(mask.at(1, 1), 1.0);
        assert_eq!(mask.at(5, 0), 0.0);
    }
}
