// src/image/pixel_buffer.rs

//! The 32-bit RGBA storage behind a photo image.
//!
//! Pixels are stored in row-major order, four bytes each (R, G, B, A), with
//! no padding between rows, so the pitch is always `width * 4`. A 0-area
//! buffer owns no allocation at all.

use crate::image::color::Rgba;
use crate::image::geom::Rect;
use crate::utils::error::{PhotoError, Result};
use log::debug;

/// Row-major RGBA pixel storage.
#[derive(Clone, Debug, Default)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

/// Byte length of a `width` x `height` buffer, or `Malloc` if the pitch or
/// total size would not fit the 32-bit arithmetic image handlers rely on.
pub fn checked_len(width: u32, height: u32) -> Result<usize> {
    if width > i32::MAX as u32 / 4 {
        return Err(PhotoError::Malloc);
    }
    let pitch = width * 4;
    if pitch != 0 && height > u32::MAX / pitch {
        return Err(PhotoError::Malloc);
    }
    Ok(height as usize * pitch as usize)
}

/// Allocates a zero-filled byte vector, reporting failure instead of aborting.
pub fn try_zeroed(len: usize) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    data.try_reserve_exact(len)?;
    data.resize(len, 0);
    Ok(data)
}

impl PixelBuffer {
    /// Creates an empty 0x0 buffer.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the dimensions as a tuple (width, height).
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Bytes per row.
    pub fn pitch(&self) -> usize {
        self.width as usize * 4
    }

    pub fn bounds(&self) -> Rect {
        Rect::sized(self.width, self.height)
    }

    /// Returns raw pixel data as a byte slice.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Returns mutable raw pixel data as a byte slice.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn pixels(&self) -> &[Rgba] {
        bytemuck::cast_slice(&self.data)
    }

    pub fn pixels_mut(&mut self) -> &mut [Rgba] {
        bytemuck::cast_slice_mut(&mut self.data)
    }

    /// Byte offset of pixel `(x, y)`.
    pub fn offset(&self, x: u32, y: u32) -> usize {
        y as usize * self.pitch() + x as usize * 4
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels()[y as usize * self.width as usize + x as usize])
    }

    pub fn pixel_mut(&mut self, x: u32, y: u32) -> Option<&mut Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let index = y as usize * self.width as usize + x as usize;
        Some(&mut self.pixels_mut()[index])
    }

    /// Sets every byte to zero (transparent black).
    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    /// Replaces the storage with a zero-filled `width` x `height` buffer and
    /// copies the pixels of `keep` over from the old storage.
    ///
    /// `keep` must lie inside both the old and the new bounds. Nothing is
    /// changed if the allocation fails.
    pub fn reallocate(&mut self, width: u32, height: u32, keep: Rect) -> Result<()> {
        let len = checked_len(width, height)?;
        let mut data = try_zeroed(len)?;
        let new_pitch = width as usize * 4;
        let old_pitch = self.pitch();

        if !self.data.is_empty() && !keep.is_empty() {
            if width == self.width {
                // Rows are laid out identically; the kept rows are one block.
                let start = keep.y as usize * new_pitch;
                let end = keep.y_max() as usize * new_pitch;
                data[start..end].copy_from_slice(&self.data[start..end]);
            } else {
                let row_bytes = keep.width as usize * 4;
                for y in keep.y as usize..keep.y_max() as usize {
                    let src = y * old_pitch + keep.x as usize * 4;
                    let dst = y * new_pitch + keep.x as usize * 4;
                    data[dst..dst + row_bytes].copy_from_slice(&self.data[src..src + row_bytes]);
                }
            }
        }

        debug!(
            "pixel buffer {}x{} -> {}x{}, kept {:?}",
            self.width, self.height, width, height, keep
        );
        self.width = width;
        self.height = height;
        self.data = data;
        Ok(())
    }
}
