// src/image/block.rs

//! Describes a rectangle of caller-supplied pixels.
//!
//! A `PhotoBlock` is the unit of exchange between photo images, format
//! handlers and callers: pixels of any size from 1 to 4 bytes, rows of any
//! pitch, and channels at arbitrary byte offsets inside a pixel. The pixel
//! bytes are either borrowed (a zero-copy view of an image) or owned (a
//! converted or snapshotted copy).

use crate::utils::error::{PhotoError, Result};
use std::borrow::Cow;

/// Pixel layout and data of a block of pixels.
#[derive(Debug, Clone)]
pub struct PhotoBlock<'a> {
    pub pixels: Cow<'a, [u8]>,
    pub width: u32,
    pub height: u32,
    /// Bytes from the start of one row to the start of the next.
    pub pitch: usize,
    /// Bytes per pixel.
    pub pixel_size: usize,
    /// Byte offsets of the red, green and blue channels within a pixel.
    pub offset: [usize; 3],
    /// Byte offset of the alpha channel, if the block has one.
    pub alpha: Option<usize>,
}

impl<'a> PhotoBlock<'a> {
    /// Tightly packed RGBA pixels.
    pub fn rgba(pixels: impl Into<Cow<'a, [u8]>>, width: u32, height: u32) -> Self {
        PhotoBlock {
            pixels: pixels.into(),
            width,
            height,
            pitch: width as usize * 4,
            pixel_size: 4,
            offset: [0, 1, 2],
            alpha: Some(3),
        }
    }

    /// Tightly packed RGB pixels, implicitly opaque.
    pub fn rgb(pixels: impl Into<Cow<'a, [u8]>>, width: u32, height: u32) -> Self {
        PhotoBlock {
            pixels: pixels.into(),
            width,
            height,
            pitch: width as usize * 3,
            pixel_size: 3,
            offset: [0, 1, 2],
            alpha: None,
        }
    }

    /// One byte per pixel, used for all three colour channels.
    pub fn gray(pixels: impl Into<Cow<'a, [u8]>>, width: u32, height: u32) -> Self {
        PhotoBlock {
            pixels: pixels.into(),
            width,
            height,
            pitch: width as usize,
            pixel_size: 1,
            offset: [0, 0, 0],
            alpha: None,
        }
    }

    /// True when the block carries an alpha channel.
    pub fn has_alpha(&self) -> bool {
        self.alpha.is_some_and(|a| a < self.pixel_size)
    }

    /// True when the red, green and blue channels may differ.
    pub fn is_color(&self) -> bool {
        self.offset[1] != self.offset[0] || self.offset[2] != self.offset[0]
    }

    /// True when the layout matches photo storage byte for byte.
    pub fn is_rgba_layout(&self) -> bool {
        self.pixel_size == 4 && self.offset == [0, 1, 2] && self.alpha == Some(3)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Checks that the channel offsets fit in a pixel and that every pixel
    /// the layout describes lies inside `pixels`.
    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Ok(());
        }
        if !(1..=4).contains(&self.pixel_size) || self.offset.iter().any(|&o| o >= self.pixel_size) {
            return Err(PhotoError::bad_value(format!(
                "invalid pixel layout: {} byte pixels with channel offsets {:?}",
                self.pixel_size, self.offset
            )));
        }
        let last_channel = self
            .offset
            .iter()
            .copied()
            .chain(self.alpha.filter(|&a| a < self.pixel_size))
            .max()
            .unwrap_or(0);
        let needed = (self.height as usize - 1)
            .checked_mul(self.pitch)
            .and_then(|n| n.checked_add((self.width as usize - 1) * self.pixel_size + last_channel + 1));
        match needed {
            Some(n) if n <= self.pixels.len() => Ok(()),
            _ => Err(PhotoError::bad_value(format!(
                "pixel data too short for a {}x{} block",
                self.width, self.height
            ))),
        }
    }

    /// Red, green, blue and alpha of pixel `(x, y)`; alpha is 255 when the
    /// block has no alpha channel.
    pub fn rgba_at(&self, x: u32, y: u32) -> [u8; 4] {
        let p = &self.pixels[y as usize * self.pitch + x as usize * self.pixel_size..];
        let alpha = match self.alpha {
            Some(a) if a < self.pixel_size => p[a],
            _ => 255,
        };
        [p[self.offset[0]], p[self.offset[1]], p[self.offset[2]], alpha]
    }

    /// Copies the pixels into a block that owns them.
    pub fn into_owned(self) -> PhotoBlock<'static> {
        PhotoBlock {
            pixels: Cow::Owned(self.pixels.into_owned()),
            width: self.width,
            height: self.height,
            pitch: self.pitch,
            pixel_size: self.pixel_size,
            offset: self.offset,
            alpha: self.alpha,
        }
    }
}
