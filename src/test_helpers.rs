//! Shared test utilities for the autocrop test suite.
//!
//! Builds synthetic sprites and catalogs so pipeline tests can run against
//! the in-memory mock backend or real PNG files in a temp directory.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let hover = square_sprite(20, 2, 3, 10);
//! let catalog = catalog_of("/in", &[("menu", &["go_hover.png", "go_idle.png"])]);
//! ```

use crate::catalog::{Catalog, CatalogDir, group_consecutive};
use crate::config::compile_group_pattern;
use crate::types::ImageRef;
use image::{Rgba, RgbaImage};
use std::path::{Path, PathBuf};

/// Square transparent canvas with an opaque `size`×`size` block at (x, y).
pub fn square_sprite(canvas: u32, x: u32, y: u32, size: u32) -> RgbaImage {
    RgbaImage::from_fn(canvas, canvas, |px, py| {
        if px >= x && px < x + size && py >= y && py < y + size {
            Rgba([200, 120, 40, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    })
}

/// Fully transparent canvas.
pub fn transparent_sprite(width: u32, height: u32) -> RgbaImage {
    RgbaImage::new(width, height)
}

/// Write a PNG, creating parent directories.
pub fn write_png(path: &Path, image: &RgbaImage) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    image.save(path).unwrap();
}

/// Build a catalog by hand, grouped with the default pattern.
///
/// Each entry is `(relative dir, file names in listing order)`.
pub fn catalog_of(root: &str, dirs: &[(&str, &[&str])]) -> Catalog {
    let regex = compile_group_pattern(crate::config::DEFAULT_GROUP_PATTERN).unwrap();
    let root = PathBuf::from(root);
    let dirs = dirs
        .iter()
        .map(|(dir, names)| {
            let relative = PathBuf::from(dir);
            let singles: Vec<ImageRef> = names
                .iter()
                .map(|name| ImageRef {
                    path: root.join(&relative).join(name),
                    dir: relative.clone(),
                    file_name: name.to_string(),
                })
                .collect();
            let groups = group_consecutive(&singles, &regex);
            CatalogDir {
                relative,
                singles,
                groups,
            }
        })
        .collect();
    Catalog { root, dirs }
}
