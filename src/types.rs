//! Shared value types passed between the catalog, imaging and process stages.
//!
//! These are fixed-shape records: the catalog creates them once and every
//! later stage only reads them.

use crate::imaging::{CropSpec, Rect};
use std::path::PathBuf;

/// One image discovered during the catalog walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    /// Absolute path of the source file.
    pub path: PathBuf,
    /// Owning directory, relative to the input root (empty for the root itself).
    pub dir: PathBuf,
    /// Raw file name, e.g. `idle_hover.png`.
    pub file_name: String,
}

/// Key derived from the first capture group of the grouping regex.
///
/// `None` means the file did not match and is never grouped with others.
pub type GroupKey = Option<String>;

/// Images that share one bounding box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub key: GroupKey,
    /// Members in discovery order.
    pub members: Vec<ImageRef>,
}

/// Outcome of cropping and saving one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CropResult {
    pub source: ImageRef,
    /// Where the cropped image was written.
    pub output: PathBuf,
    /// The image's own content box in source coordinates.
    pub content: Rect,
    /// The crop that was applied (the union box for grouped images).
    pub applied: CropSpec,
    /// Output canvas size (width, height).
    pub size: (u32, u32),
}
