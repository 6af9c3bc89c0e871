//! # Autocrop
//!
//! Trims transparent (or black) margins off sprite images and records where
//! the visible content sat, so a game engine can place the trimmed sprite
//! back at its original position.
//!
//! # Architecture: Three-Stage Pipeline
//!
//! ```text
//! 1. Catalog   input/   →  Catalog            (filesystem → directories, images, groups)
//! 2. Crop      Catalog  →  output/**/*.png    (bounding box, shared box per group, border)
//! 3. Record    results  →  output/**/coords.txt  (one formatted line per image)
//! ```
//!
//! Stages 2 and 3 live together in [`process`]: units are cropped in parallel,
//! then every manifest line is written in catalog order so manifests are
//! byte-identical between runs.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`catalog`] | Walks the input tree, filters by extension, groups by regex key |
//! | [`process`] | Crops every unit, saves the output tree, writes manifests |
//! | [`imaging`] | Content box detection, union box, crop + border, codec backend |
//! | [`formatting`] | Pattern → template table and placeholder rendering |
//! | [`coords`] | Per-directory manifest writer and line rendering |
//! | [`config`] | Run options, defaults and validation |
//! | [`types`] | Shared records passed between stages (`ImageRef`, `Group`, `CropResult`) |
//! | [`output`] | CLI output formatting for each stage |
//!
//! # Design Decisions
//!
//! ## Groups Share One Box
//!
//! Animation frames (`start_hover.png`, `start_idle.png`) must stay the same
//! size and keep their relative alignment after trimming, or the sprite
//! jumps when the engine swaps frames. Group mode therefore decodes and
//! measures every member first, takes the union of their boxes and crops all
//! of them with it.
//!
//! ## Coordinates Are Per Image
//!
//! A manifest line always records the image's *own* content box in source
//! coordinates, even in group mode. The shared box only decides the output
//! canvas.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding, cropping and encoding use the `image` crate only. The binary
//! has no system dependencies.

pub mod catalog;
pub mod config;
pub mod coords;
pub mod formatting;
pub mod imaging;
pub mod output;
pub mod process;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
