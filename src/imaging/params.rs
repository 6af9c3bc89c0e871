//! Parameter types for crop operations.
//!
//! These structs describe *what* to cut, not *how*. The
//! [`operations`](super::operations) module turns them into pixels.

use super::calculations::{Rect, padded_size};

/// Transparent padding added on every side of a crop, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Border {
    pub width: u32,
    pub height: u32,
}

impl Border {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// A content rect plus the border applied around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropSpec {
    pub rect: Rect,
    pub border: Border,
}

impl CropSpec {
    pub fn new(rect: Rect, border: Border) -> Self {
        Self { rect, border }
    }

    /// Output canvas size: the rect grown by the border on both sides.
    pub fn canvas_size(&self) -> (u32, u32) {
        padded_size(&self.rect, (self.border.width, self.border.height))
    }
}
