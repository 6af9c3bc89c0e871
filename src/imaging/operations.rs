//! Buffer-level operations: content detection and padded cropping.
//!
//! These functions take decoded images and return new buffers. They never
//! touch the filesystem and never mutate their inputs; the
//! [`process`](crate::process) stage pairs them with a backend.

use super::calculations::{Rect, union_rect};
use super::params::{Border, CropSpec};
use image::{
    DynamicImage, GenericImageView, ImageBuffer, Luma, LumaA, Pixel, Rgb, Rgba, RgbaImage, imageops,
};
use thiserror::Error;

/// Raised when no image in a group has a single visible pixel.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("no image in the group has visible content")]
pub struct EmptyGroupError;

/// Content boxes of a group's members plus the box they share.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupBounds {
    /// One entry per member, `None` for fully transparent members.
    pub members: Vec<Option<Rect>>,
    pub union: Rect,
}

/// Smallest rect enclosing every visible pixel, or `None` if there is none.
///
/// Images with an alpha channel count a pixel as visible when its alpha is
/// non-zero at the image's native depth, so faint 16-bit alpha is kept.
/// Opaque formats count any non-black pixel.
pub fn bounding_box(image: &DynamicImage) -> Option<Rect> {
    match image {
        DynamicImage::ImageLumaA8(buf) => scan_pixels(buf, |p: &LumaA<u8>| p[1] != 0),
        DynamicImage::ImageRgba8(buf) => scan_pixels(buf, |p: &Rgba<u8>| p[3] != 0),
        DynamicImage::ImageLumaA16(buf) => scan_pixels(buf, |p: &LumaA<u16>| p[1] != 0),
        DynamicImage::ImageRgba16(buf) => scan_pixels(buf, |p: &Rgba<u16>| p[3] != 0),
        DynamicImage::ImageRgba32F(buf) => scan_pixels(buf, |p: &Rgba<f32>| p[3] > 0.0),
        DynamicImage::ImageLuma16(buf) => scan_pixels(buf, |p: &Luma<u16>| p[0] != 0),
        DynamicImage::ImageRgb16(buf) => scan_pixels(buf, |p: &Rgb<u16>| p.0 != [0; 3]),
        DynamicImage::ImageRgb32F(buf) => scan_pixels(buf, |p: &Rgb<f32>| p.0 != [0.0; 3]),
        other => {
            let has_alpha = other.color().has_alpha();
            let mut bounds: Option<Rect> = None;
            for (x, y, pixel) in other.pixels() {
                let visible = if has_alpha {
                    pixel[3] != 0
                } else {
                    pixel[0] != 0 || pixel[1] != 0 || pixel[2] != 0
                };
                if visible {
                    bounds = Some(grow(bounds, x, y));
                }
            }
            bounds
        }
    }
}

fn scan_pixels<P: Pixel>(
    buf: &ImageBuffer<P, Vec<P::Subpixel>>,
    visible: impl Fn(&P) -> bool,
) -> Option<Rect> {
    buf.enumerate_pixels()
        .filter(|(_, _, pixel)| visible(pixel))
        .fold(None, |bounds, (x, y, _)| Some(grow(bounds, x, y)))
}

fn grow(bounds: Option<Rect>, x: u32, y: u32) -> Rect {
    let px = Rect {
        left: x,
        top: y,
        right: x + 1,
        bottom: y + 1,
    };
    bounds.map_or(px, |b| b.union(&px))
}

/// Measure every image, then union the boxes that exist.
///
/// Fully transparent members are ignored for the union but still reported
/// as `None` in [`GroupBounds::members`].
pub fn union_bounding_box(images: &[DynamicImage]) -> Result<GroupBounds, EmptyGroupError> {
    let members: Vec<Option<Rect>> = images.iter().map(bounding_box).collect();
    let present: Vec<Rect> = members.iter().flatten().copied().collect();
    let union = union_rect(&present).ok_or(EmptyGroupError)?;
    Ok(GroupBounds { members, union })
}

/// Copy `image` onto a fully transparent canvas grown by `border` on every side.
pub fn pad(image: &RgbaImage, border: Border) -> RgbaImage {
    let mut canvas = RgbaImage::new(
        image.width() + 2 * border.width,
        image.height() + 2 * border.height,
    );
    imageops::replace(&mut canvas, image, border.width as i64, border.height as i64);
    canvas
}

/// Crop `image` to `spec.rect` and place it on a transparent padded canvas.
///
/// The canvas always has [`CropSpec::canvas_size`] dimensions. Parts of the
/// rect that fall outside the source (a group member smaller than the
/// shared box) stay transparent. Pixels are copied, never blended.
pub fn crop(image: &DynamicImage, spec: &CropSpec) -> RgbaImage {
    let (canvas_w, canvas_h) = spec.canvas_size();
    let mut canvas = RgbaImage::new(canvas_w, canvas_h);

    let rect = spec.rect;
    let left = rect.left.min(image.width());
    let top = rect.top.min(image.height());
    let right = rect.right.min(image.width());
    let bottom = rect.bottom.min(image.height());

    if right > left && bottom > top {
        let region = image.crop_imm(left, top, right - left, bottom - top).to_rgba8();
        let x = spec.border.width + (left - rect.left);
        let y = spec.border.height + (top - rect.top);
        imageops::replace(&mut canvas, &region, x as i64, y as i64);
    }

    canvas
}
