//! Skeleton overlay renderer.
//!
//! Draws detected landmarks and the fixed skeleton edges onto a copy of the
//! frame. The input frame is never mutated; an empty detection returns a
//! pixel-identical copy.

use crate::detect::{DetectionResult, Pose, POSE_CONNECTIONS};
use crate::frame::{Frame, BYTES_PER_PIXEL};
use crate::FrameError;

/// RGB color.
pub type Color = [u8; 3];

/// Overlay colors and geometry.
#[derive(Clone, Debug)]
pub struct OverlayStyle {
    /// Keypoint marker color.
    pub landmark_color: Color,
    /// Skeleton edge color.
    pub edge_color: Color,
    /// Marker color for landmarks below the visibility threshold.
    pub low_confidence_color: Color,
    /// Marker radius in pixels.
    pub marker_radius: i32,
    /// Landmarks below this visibility are drawn low-confidence and their
    /// edges are skipped.
    pub visibility_threshold: f32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            landmark_color: [0, 255, 0],
            edge_color: [255, 255, 0],
            low_confidence_color: [255, 0, 0],
            marker_radius: 3,
            visibility_threshold: 0.5,
        }
    }
}

/// Renders landmark overlays onto frames.
pub struct OverlayRenderer {
    style: OverlayStyle,
}

impl OverlayRenderer {
    pub fn new(style: OverlayStyle) -> Self {
        Self { style }
    }

    /// Draw the detection onto a copy of the frame.
    ///
    /// An empty detection returns an untouched copy. A pose whose landmark
    /// list does not cover a skeleton edge index is `FrameError::Data`.
    pub fn render(&self, frame: &Frame, detection: &DetectionResult) -> Result<Frame, FrameError> {
        if !detection.has_pose() {
            return Ok(frame.clone());
        }

        let mut pixels = frame.pixels().to_vec();
        let width = frame.width();
        let height = frame.height();

        for pose in &detection.poses {
            self.draw_pose(&mut pixels, width, height, pose)?;
        }

        frame
            .with_pixels(pixels)
            .map_err(|e| FrameError::Data(e.to_string()))
    }

    fn draw_pose(
        &self,
        pixels: &mut [u8],
        width: u32,
        height: u32,
        pose: &Pose,
    ) -> Result<(), FrameError> {
        // Edges first so markers draw on top of them.
        for (a, b) in POSE_CONNECTIONS {
            let from = pose.landmarks.get(a.as_usize()).ok_or_else(|| {
                FrameError::Data(format!("skeleton edge references missing landmark {:?}", a))
            })?;
            let to = pose.landmarks.get(b.as_usize()).ok_or_else(|| {
                FrameError::Data(format!("skeleton edge references missing landmark {:?}", b))
            })?;
            if from.visibility < self.style.visibility_threshold
                || to.visibility < self.style.visibility_threshold
            {
                continue;
            }
            let (x0, y0) = to_pixel(from.x, from.y, width, height);
            let (x1, y1) = to_pixel(to.x, to.y, width, height);
            draw_line(pixels, width, height, x0, y0, x1, y1, self.style.edge_color);
        }

        for lm in &pose.landmarks {
            let color = if lm.visibility < self.style.visibility_threshold {
                self.style.low_confidence_color
            } else {
                self.style.landmark_color
            };
            let (cx, cy) = to_pixel(lm.x, lm.y, width, height);
            draw_disk(pixels, width, height, cx, cy, self.style.marker_radius, color);
        }

        Ok(())
    }
}

impl Default for OverlayRenderer {
    fn default() -> Self {
        Self::new(OverlayStyle::default())
    }
}

/// Map a normalized coordinate to pixel space.
fn to_pixel(x: f32, y: f32, width: u32, height: u32) -> (i32, i32) {
    (
        (x * width as f32).round() as i32,
        (y * height as f32).round() as i32,
    )
}

fn put_pixel(pixels: &mut [u8], width: u32, height: u32, x: i32, y: i32, color: Color) {
    if x < 0 || y < 0 || x >= width as i32 || y >= height as i32 {
        return;
    }
    let offset = (y as usize * width as usize + x as usize) * BYTES_PER_PIXEL;
    pixels[offset..offset + BYTES_PER_PIXEL].copy_from_slice(&color);
}

fn draw_disk(pixels: &mut [u8], width: u32, height: u32, cx: i32, cy: i32, radius: i32, color: Color) {
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                put_pixel(pixels, width, height, cx + dx, cy + dy, color);
            }
        }
    }
}

/// Bresenham line.
fn draw_line(
    pixels: &mut [u8],
    width: u32,
    height: u32,
    mut x0: i32,
    mut y0: i32,
    x1: i32,
    y1: i32,
    color: Color,
) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        put_pixel(pixels, width, height, x0, y0, color);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{Landmark, StubLandmarker, POSE_LANDMARK_COUNT};

    fn blank_frame(width: u32, height: u32) -> Frame {
        Frame::new(
            vec![0u8; width as usize * height as usize * BYTES_PER_PIXEL],
            width,
            height,
            0,
            0,
        )
        .unwrap()
    }

    fn pixel_at(frame: &Frame, x: u32, y: u32) -> Color {
        let offset = (y as usize * frame.width() as usize + x as usize) * BYTES_PER_PIXEL;
        let p = &frame.pixels()[offset..offset + BYTES_PER_PIXEL];
        [p[0], p[1], p[2]]
    }

    #[test]
    fn empty_detection_returns_identical_pixels() {
        let frame = blank_frame(16, 16);
        let renderer = OverlayRenderer::default();
        let out = renderer.render(&frame, &DetectionResult::none()).unwrap();
        assert_eq!(out.pixels(), frame.pixels());
    }

    #[test]
    fn input_frame_is_not_mutated() {
        let frame = blank_frame(64, 64);
        let before = frame.pixels().to_vec();
        let detection = DetectionResult {
            poses: vec![StubLandmarker::canned_pose()],
            mask: None,
        };
        let out = OverlayRenderer::default().render(&frame, &detection).unwrap();
        assert_eq!(frame.pixels(), &before[..]);
        assert_ne!(out.pixels(), frame.pixels());
    }

    #[test]
    fn marker_lands_at_scaled_position() {
        let frame = blank_frame(100, 100);
        let mut pose = StubLandmarker::canned_pose();
        // Park every landmark well out of the probe area, then place one.
        for lm in &mut pose.landmarks {
            lm.x = 0.9;
            lm.y = 0.9;
        }
        pose.landmarks[0] = Landmark {
            x: 0.25,
            y: 0.25,
            z: 0.0,
            visibility: 0.99,
            presence: 0.99,
        };
        let detection = DetectionResult {
            poses: vec![pose],
            mask: None,
        };
        let out = OverlayRenderer::default().render(&frame, &detection).unwrap();
        let color = pixel_at(&out, 25, 25);
        // Nose marker, or an edge passing through it.
        assert!(color == [0, 255, 0] || color == [255, 255, 0]);
    }

    #[test]
    fn low_visibility_landmark_uses_low_confidence_color() {
        let frame = blank_frame(100, 100);
        let mut pose = StubLandmarker::canned_pose();
        for lm in &mut pose.landmarks {
            lm.visibility = 0.1;
        }
        pose.landmarks[0].x = 0.5;
        pose.landmarks[0].y = 0.5;
        let detection = DetectionResult {
            poses: vec![pose],
            mask: None,
        };
        let out = OverlayRenderer::default().render(&frame, &detection).unwrap();
        // All edges skipped, every marker red.
        assert_eq!(pixel_at(&out, 50, 50), [255, 0, 0]);
    }

    #[test]
    fn truncated_pose_is_a_data_error() {
        let frame = blank_frame(32, 32);
        let mut pose = StubLandmarker::canned_pose();
        pose.landmarks.truncate(POSE_LANDMARK_COUNT - 10);
        let detection = DetectionResult {
            poses: vec![pose],
            mask: None,
        };
        let err = OverlayRenderer::default().render(&frame, &detection);
        assert!(matches!(err, Err(FrameError::Data(_))));
    }

    #[test]
    fn off_frame_coordinates_are_clipped_not_panicking() {
        let frame = blank_frame(8, 8);
        let mut pose = StubLandmarker::canned_pose();
        for lm in &mut pose.landmarks {
            lm.x = 1.0;
            lm.y = 1.0;
        }
        let detection = DetectionResult {
            poses: vec![pose],
            mask: None,
        };
        // (1.0, 1.0) maps to pixel (8, 8), one past the last row/column.
        assert!(OverlayRenderer::default().render(&frame, &detection).is_ok());
    }
}
