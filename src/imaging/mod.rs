//! Image handling, pure Rust, built on the `image` crate.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode / encode** | [`ImageBackend`] → [`RustBackend`] (`image::ImageReader`, `save_with_format`) |
//! | **Content box** | [`bounding_box`] (alpha scan) |
//! | **Shared box** | [`union_bounding_box`] |
//! | **Crop + border** | [`crop`] (`crop_imm` + `imageops::replace` onto a transparent canvas) |
//!
//! The module is split into:
//! - **Calculations**: Pure rect arithmetic (unit testable)
//! - **Parameters**: Data structures describing a crop
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: Buffer functions combining calculations + parameters

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend};
pub use calculations::{Rect, padded_size, union_rect};
pub use operations::{EmptyGroupError, GroupBounds, bounding_box, crop, pad, union_bounding_box};
pub use params::{Border, CropSpec};
pub use rust_backend::RustBackend;
