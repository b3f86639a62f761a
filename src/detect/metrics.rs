//! Landmark accuracy metrics.
//!
//! Used to score a landmarker backend against ground-truth annotations:
//! MPJPE (mean per-joint position error) and PCK (percentage of correct
//! keypoints within a distance threshold). Both operate on normalized
//! coordinates, so thresholds are resolution-independent.

use crate::detect::result::Landmark;

/// Ground-truth keypoint: normalized (x, y).
#[derive(Clone, Copy, Debug)]
pub struct GroundTruth {
    pub x: f32,
    pub y: f32,
}

/// Mean per-joint position error over paired landmarks, in normalized units.
///
/// Pairs are matched by index; surplus entries on either side are ignored.
/// Returns 0.0 when there are no pairs to compare.
pub fn mpjpe(pred: &[Landmark], gt: &[GroundTruth]) -> f64 {
    let mut sum = 0.0f64;
    let mut count = 0usize;
    for (p, g) in pred.iter().zip(gt.iter()) {
        let ex = (p.x - g.x) as f64;
        let ey = (p.y - g.y) as f64;
        sum += (ex * ex + ey * ey).sqrt();
        count += 1;
    }
    if count == 0 {
        return 0.0;
    }
    sum / count as f64
}

/// Fraction of landmarks within `threshold` (normalized distance) of ground
/// truth. Returns 0.0 when there are no pairs to compare.
pub fn pck(pred: &[Landmark], gt: &[GroundTruth], threshold: f64) -> f64 {
    let mut correct = 0usize;
    let mut count = 0usize;
    for (p, g) in pred.iter().zip(gt.iter()) {
        let ex = (p.x - g.x) as f64;
        let ey = (p.y - g.y) as f64;
        if (ex * ex + ey * ey).sqrt() < threshold {
            correct += 1;
        }
        count += 1;
    }
    if count == 0 {
        return 0.0;
    }
    correct as f64 / count as f64
}
