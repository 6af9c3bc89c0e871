//! Image codec backend trait and shared types.
//!
//! The [`ImageBackend`] trait covers the operations that touch the
//! filesystem: decoding a source image, encoding a cropped canvas, and
//! removing an output again when its group could not be completed.
//! Content detection and cropping are pure buffer functions in
//! [`operations`](super::operations), so they never need a backend.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Tests use an in-memory mock.

use image::{DynamicImage, RgbaImage};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode {path}: {message}")]
    Decode { path: String, message: String },
    #[error("Failed to encode {path}: {message}")]
    Encode { path: String, message: String },
}

/// Trait for image codec backends.
///
/// Must be `Sync`: one backend is shared by every rayon worker.
pub trait ImageBackend: Sync {
    /// Decode the image at `path`.
    fn load(&self, path: &Path) -> Result<DynamicImage, BackendError>;

    /// Encode `image` to `path`, creating parent directories as needed.
    /// The format is inferred from the extension.
    fn save(&self, image: &RgbaImage, path: &Path) -> Result<(), BackendError>;

    /// Delete an output written earlier in this run.
    fn remove(&self, path: &Path) -> Result<(), BackendError>;
}
