// src/image/compositor.rs

//! Pixel-level blitting of a `PhotoBlock` into a `PixelBuffer`.
//!
//! Two compositing rules exist: `Set` replaces destination pixels, `Overlay`
//! draws the source over the destination with the Porter-Duff "source over"
//! operator in 8-bit fixed point. A block smaller than the destination
//! rectangle is tiled to fill it.
//!
//! These functions only touch pixels. Clipping against the image, growing
//! the buffer, valid-region bookkeeping and change notification are done by
//! the photo model that calls them.

use crate::image::block::PhotoBlock;
use crate::image::geom::Rect;
use crate::image::pixel_buffer::PixelBuffer;
use crate::utils::error::{PhotoError, Result};
use std::fmt;
use std::str::FromStr;

/// How source pixels combine with the pixels already in the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompositingRule {
    /// Destination is replaced by the source, alpha included.
    Set,
    /// Source is drawn over the destination.
    #[default]
    Overlay,
}

impl FromStr for CompositingRule {
    type Err = PhotoError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            _ if !s.is_empty() && "set".starts_with(s) => Ok(CompositingRule::Set),
            _ if !s.is_empty() && "overlay".starts_with(s) => Ok(CompositingRule::Overlay),
            _ => Err(PhotoError::bad_value(format!(
                "bad compositing rule \"{}\": must be overlay or set",
                s
            ))),
        }
    }
}

impl fmt::Display for CompositingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CompositingRule::Set => "set",
            CompositingRule::Overlay => "overlay",
        })
    }
}

/// Zoom and subsample factors of a scaled blit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scale {
    pub zoom_x: i32,
    pub zoom_y: i32,
    pub subsample_x: i32,
    pub subsample_y: i32,
}

impl Default for Scale {
    fn default() -> Self {
        Scale::IDENTITY
    }
}

impl Scale {
    pub const IDENTITY: Scale = Scale {
        zoom_x: 1,
        zoom_y: 1,
        subsample_x: 1,
        subsample_y: 1,
    };

    pub fn new(zoom_x: i32, zoom_y: i32, subsample_x: i32, subsample_y: i32) -> Self {
        Scale {
            zoom_x,
            zoom_y,
            subsample_x,
            subsample_y,
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Scale::IDENTITY
    }
}

/// Number of source pixels left after taking every `subsample`th one of
/// `len`, counting from the far end when `subsample` is negative.
pub fn subsampled_len(len: u32, subsample: i32) -> u32 {
    match subsample {
        0 => 0,
        s => len.div_ceil(s.unsigned_abs()),
    }
}

/// Porter-Duff "source over" for one colour channel.
pub fn src_over(src: u8, src_alpha: u8, dst: u8, dst_alpha: u8) -> u8 {
    let (s, a, d, da) = (src as u32, src_alpha as u32, dst as u32, dst_alpha as u32);
    (s * a / 255 + da * (255 - a) / 255 * d / 255) as u8
}

/// Porter-Duff "source over" for the alpha channel.
pub fn src_over_alpha(dst_alpha: u8, src_alpha: u8) -> u8 {
    let (da, a) = (dst_alpha as u32, src_alpha as u32);
    (da + (255 - da) * a / 255) as u8
}

/// Writes one source pixel into the four destination bytes.
#[inline]
fn composite(dst: &mut [u8], src: [u8; 4], has_alpha: bool, rule: CompositingRule) {
    if !has_alpha {
        dst[..4].copy_from_slice(&[src[0], src[1], src[2], 255]);
        return;
    }
    match rule {
        CompositingRule::Set => dst[..4].copy_from_slice(&src),
        CompositingRule::Overlay => {
            let alpha = src[3];
            if alpha == 0 {
                return;
            }
            let dst_alpha = dst[3];
            if alpha == 255 || dst_alpha == 0 {
                dst[..4].copy_from_slice(&src);
                return;
            }
            dst[0] = src_over(src[0], alpha, dst[0], dst_alpha);
            dst[1] = src_over(src[1], alpha, dst[1], dst_alpha);
            dst[2] = src_over(src[2], alpha, dst[2], dst_alpha);
            dst[3] = src_over_alpha(dst_alpha, alpha);
        }
    }
}

/// Copies `block` into `dest` of `buffer` at 1:1 scale.
///
/// `dest` must already lie inside the buffer.
pub fn blit(buffer: &mut PixelBuffer, block: &PhotoBlock, dest: Rect, rule: CompositingRule) {
    if dest.is_empty() || block.is_empty() {
        return;
    }
    let pitch = buffer.pitch();
    let row_bytes = dest.width as usize * 4;
    let start = buffer.offset(dest.x as u32, dest.y as u32);
    let fits = dest.width <= block.width && dest.height <= block.height;
    let raw_copy = block.is_rgba_layout() && rule == CompositingRule::Set;

    if raw_copy
        && fits
        && (dest.height == 1 || (dest.x == 0 && dest.width == buffer.width() && block.pitch == pitch))
    {
        let len = dest.height as usize * row_bytes;
        buffer.as_bytes_mut()[start..start + len].copy_from_slice(&block.pixels[..len]);
        return;
    }

    let has_alpha = block.has_alpha();
    let data = buffer.as_bytes_mut();
    for dy in 0..dest.height {
        let sy = dy % block.height;
        let line = start + dy as usize * pitch;

        if raw_copy && dest.width <= block.width {
            let src = sy as usize * block.pitch;
            data[line..line + row_bytes].copy_from_slice(&block.pixels[src..src + row_bytes]);
            continue;
        }

        for dx in 0..dest.width {
            let src = block.rgba_at(dx % block.width, sy);
            let at = line + dx as usize * 4;
            composite(&mut data[at..at + 4], src, has_alpha, rule);
        }
    }
}

/// Copies `block` into `dest` of `buffer`, first taking every
/// `subsample`th source pixel and then repeating each one `zoom` times.
///
/// A negative subsample walks the source backwards, mirroring it. Zoom
/// factors must be positive and subsample factors non-zero; `dest` must
/// already lie inside the buffer.
pub fn blit_zoomed(
    buffer: &mut PixelBuffer,
    block: &PhotoBlock,
    dest: Rect,
    scale: Scale,
    rule: CompositingRule,
) {
    debug_assert!(scale.zoom_x > 0 && scale.zoom_y > 0);
    debug_assert!(scale.subsample_x != 0 && scale.subsample_y != 0);
    let tile_w = subsampled_len(block.width, scale.subsample_x).saturating_mul(scale.zoom_x as u32);
    let tile_h = subsampled_len(block.height, scale.subsample_y).saturating_mul(scale.zoom_y as u32);
    if dest.is_empty() || tile_w == 0 || tile_h == 0 {
        return;
    }

    let source_index = |d: u32, tile: u32, zoom: i32, subsample: i32, len: u32| -> u32 {
        let n = (d % tile) / zoom as u32;
        if subsample > 0 {
            n * subsample as u32
        } else {
            len - 1 - n * subsample.unsigned_abs()
        }
    };
    let columns: Vec<u32> = (0..dest.width)
        .map(|dx| source_index(dx, tile_w, scale.zoom_x, scale.subsample_x, block.width))
        .collect();

    let has_alpha = block.has_alpha();
    let pitch = buffer.pitch();
    let start = buffer.offset(dest.x as u32, dest.y as u32);
    let data = buffer.as_bytes_mut();
    for dy in 0..dest.height {
        let sy = source_index(dy, tile_h, scale.zoom_y, scale.subsample_y, block.height);
        let line = start + dy as usize * pitch;
        for (dx, &sx) in columns.iter().enumerate() {
            let at = line + dx * 4;
            composite(&mut data[at..at + 4], block.rgba_at(sx, sy), has_alpha, rule);
        }
    }
}
