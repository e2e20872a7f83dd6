use serde::{Deserialize, Serialize};

/// Axis-aligned face box in frame pixel coordinates.
///
/// Detectors may report boxes that hang off the frame edge, so the origin
/// is signed and clamping happens only when pixels are read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Returns `(x1, y1, x2, y2)` clamped to a `frame_w` x `frame_h` frame,
    /// or `None` when nothing of the box is visible.
    pub fn clamp_to(&self, frame_w: u32, frame_h: u32) -> Option<(u32, u32, u32, u32)> {
        let x1 = (self.x as i64).clamp(0, frame_w as i64);
        let y1 = (self.y as i64).clamp(0, frame_h as i64);
        let x2 = (self.x as i64 + self.width as i64).clamp(0, frame_w as i64);
        let y2 = (self.y as i64 + self.height as i64).clamp(0, frame_h as i64);

        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        Some((x1 as u32, y1 as u32, x2 as u32, y2 as u32))
    }
}
