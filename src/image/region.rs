// src/image/region.rs

//! The set of pixels that hold real image data.
//!
//! A photo image distinguishes pixels that were written from pixels that were
//! never written (or were explicitly made fully transparent). The region is
//! stored as one bit per pixel over the image extent, so union, subtraction,
//! intersection and the bounding-box query are all row-slice operations.

use crate::image::geom::Rect;
use bitvec::prelude::*;

/// Pixels of an image that are considered valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidRegion {
    width: u32,
    height: u32,
    mask: BitVec,
}

impl ValidRegion {
    /// Creates an empty region over a 0x0 extent.
    pub fn new() -> Self {
        Self::default()
    }

    /// The extent the region is confined to.
    pub fn extent(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Changes the extent, keeping the overlap and dropping everything outside.
    pub fn resize(&mut self, width: u32, height: u32) {
        if (width, height) == (self.width, self.height) {
            return;
        }
        let mut mask = BitVec::repeat(false, width as usize * height as usize);
        let copy_w = self.width.min(width) as usize;
        let copy_h = self.height.min(height) as usize;
        if copy_w > 0 {
            for y in 0..copy_h {
                let src = y * self.width as usize;
                let dst = y * width as usize;
                mask[dst..dst + copy_w].copy_from_bitslice(&self.mask[src..src + copy_w]);
            }
        }
        self.width = width;
        self.height = height;
        self.mask = mask;
    }

    /// Removes every pixel.
    pub fn clear(&mut self) {
        self.mask.fill(false);
    }

    pub fn is_empty(&self) -> bool {
        self.mask.not_any()
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.mask[self.index(x, y)]
    }

    /// Number of valid pixels.
    pub fn len(&self) -> usize {
        self.mask.count_ones()
    }

    /// Adds every pixel of `rect` that lies inside the extent.
    pub fn union_rect(&mut self, rect: Rect) {
        self.fill_rect(rect, true);
    }

    /// Removes every pixel of `rect`.
    pub fn subtract_rect(&mut self, rect: Rect) {
        self.fill_rect(rect, false);
    }

    /// Keeps only the pixels inside `rect`.
    pub fn intersect_rect(&mut self, rect: Rect) {
        let keep = rect.intersection(&self.bounds());
        if keep.is_empty() {
            self.clear();
            return;
        }
        let (x0, x1) = (keep.x as usize, keep.x_max() as usize);
        let (y0, y1) = (keep.y as u32, keep.y_max() as u32);
        let width = self.width as usize;
        for y in 0..self.height {
            let row = y as usize * width;
            if y < y0 || y >= y1 {
                self.mask[row..row + width].fill(false);
            } else {
                self.mask[row..row + x0].fill(false);
                self.mask[row + x1..row + width].fill(false);
            }
        }
    }

    /// Adds the pixels of `rect` whose alpha byte is non-zero.
    ///
    /// `alpha` starts at the alpha byte of the top-left pixel of `rect`;
    /// consecutive pixels are `stride` bytes apart and rows are `pitch` bytes
    /// apart.
    pub fn union_alpha(&mut self, rect: Rect, alpha: &[u8], stride: usize, pitch: usize) {
        let rect = rect.intersection(&self.bounds());
        for row in 0..rect.height as usize {
            let base = self.index(rect.x as u32, rect.y as u32 + row as u32);
            let line = &alpha[row * pitch..];
            for col in 0..rect.width as usize {
                if line[col * stride] != 0 {
                    self.mask.set(base + col, true);
                }
            }
        }
    }

    /// The smallest rectangle containing every valid pixel.
    pub fn clip_box(&self) -> Rect {
        let width = self.width as usize;
        if width == 0 {
            return Rect::empty();
        }
        let mut bbox = Rect::empty();
        for (y, row) in self.mask.chunks(width).enumerate() {
            if let (Some(first), Some(last)) = (row.first_one(), row.last_one()) {
                let span = Rect::new(first as i32, y as i32, (last + 1 - first) as u32, 1);
                bbox = bbox.union(&span);
            }
        }
        bbox
    }

    fn bounds(&self) -> Rect {
        Rect::sized(self.width, self.height)
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    fn fill_rect(&mut self, rect: Rect, value: bool) {
        let rect = rect.intersection(&self.bounds());
        if rect.is_empty() {
            return;
        }
        for y in rect.y as u32..rect.y_max() as u32 {
            let start = self.index(rect.x as u32, y);
            self.mask[start..start + rect.width as usize].fill(value);
        }
    }
}
