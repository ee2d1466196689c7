// src/photo/model.rs

//! The per-image aggregate behind a photo image.
//!
//! A `PhotoModel` owns the RGBA storage, the valid region, the dither cursor
//! and the image configuration. Every write goes through the same sequence:
//! clip to the requested size, grow the storage, composite, update the valid
//! region, reclassify alpha, re-dither, and finally notify the observer. The
//! observer therefore never sees a partially updated image.

use crate::format::{FormatSpec, Metadata};
use crate::image::alpha::{has_complex_alpha, span_has_complex_alpha};
use crate::image::block::PhotoBlock;
use crate::image::color::{Palette, Rgb, Rgba};
use crate::image::compositor::{blit, blit_zoomed, CompositingRule, Scale};
use crate::image::geom::Rect;
use crate::image::pixel_buffer::{try_zeroed, PixelBuffer};
use crate::image::region::ValidRegion;
use crate::photo::instance::{ImageObserver, PhotoInstance};
use crate::utils::error::{PhotoError, Result};
use log::{debug, trace};
use std::borrow::Cow;
use std::fmt;

/// Sticky state of an image. Only [`PhotoModel::blank`] clears them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhotoFlags {
    /// Some write came from a source whose colour channels differ.
    pub color_image: bool,
    /// Some pixel has alpha strictly between 0 and 255.
    pub complex_alpha: bool,
    /// The configuration changed in a way that needs a full redisplay.
    pub image_changed: bool,
}

/// A transparency value for [`PhotoModel::set_transparency`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transparency {
    /// `true` maps to alpha 0, `false` to alpha 255.
    Transparent(bool),
    /// An explicit alpha value.
    Alpha(u8),
}

/// How [`PhotoModel::export`] should prepare pixels for an encoder.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ExportOptions {
    /// Area to export; the whole image when `None`.
    pub from: Option<Rect>,
    /// Composite onto this colour and drop alpha.
    pub background: Option<Rgb>,
    /// Reduce colour pixels to a single luma channel.
    pub grayscale: bool,
}

/// Largest coordinate a write may reach.
const MAX_EXTENT: u32 = i32::MAX as u32;

/// A photo image: pixels plus everything needed to keep them consistent.
pub struct PhotoModel {
    pub(crate) buffer: PixelBuffer,
    pub(crate) region: ValidRegion,
    pub(crate) dither_x: u32,
    pub(crate) dither_y: u32,
    pub(crate) user_width: u32,
    pub(crate) user_height: u32,
    pub(crate) gamma: f64,
    pub(crate) palette: Palette,
    pub(crate) format: Option<FormatSpec>,
    pub(crate) metadata: Metadata,
    pub(crate) file: Option<String>,
    pub(crate) data: Option<Vec<u8>>,
    pub(crate) flags: PhotoFlags,
    instances: Vec<Box<dyn PhotoInstance>>,
    observer: Option<Box<dyn ImageObserver>>,
}

impl Default for PhotoModel {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PhotoModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhotoModel")
            .field("size", &self.buffer.dimensions())
            .field("user_size", &(self.user_width, self.user_height))
            .field("dither", &(self.dither_x, self.dither_y))
            .field("flags", &self.flags)
            .field("format", &self.format)
            .field("file", &self.file)
            .field("instances", &self.instances.len())
            .finish()
    }
}

impl PhotoModel {
    /// Creates an empty 0x0 image.
    pub fn new() -> Self {
        PhotoModel {
            buffer: PixelBuffer::new(),
            region: ValidRegion::new(),
            dither_x: 0,
            dither_y: 0,
            user_width: 0,
            user_height: 0,
            gamma: 1.0,
            palette: Palette::Default,
            format: None,
            metadata: Metadata::new(),
            file: None,
            data: None,
            flags: PhotoFlags::default(),
            instances: Vec::new(),
            observer: None,
        }
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.buffer.dimensions()
    }

    /// The `-width`/`-height` request; 0 means "follow the content".
    pub fn user_size(&self) -> (u32, u32) {
        (self.user_width, self.user_height)
    }

    pub fn pixels(&self) -> &PixelBuffer {
        &self.buffer
    }

    pub fn valid_region(&self) -> &ValidRegion {
        &self.region
    }

    pub fn flags(&self) -> PhotoFlags {
        self.flags
    }

    pub fn is_color(&self) -> bool {
        self.flags.color_image
    }

    pub fn has_complex_alpha(&self) -> bool {
        self.flags.complex_alpha
    }

    /// First pixel, in scan order, that may not be dithered yet.
    pub fn dither_cursor(&self) -> (u32, u32) {
        (self.dither_x, self.dither_y)
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    pub fn palette(&self) -> Palette {
        self.palette
    }

    pub fn format(&self) -> Option<&FormatSpec> {
        self.format.as_ref()
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    pub fn data(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    /// Attaches a display instance and brings it up to date.
    pub fn add_instance(&mut self, mut instance: Box<dyn PhotoInstance>) {
        instance.on_configure(self.gamma, self.palette);
        instance.on_resize(self.width(), self.height());
        self.instances.push(instance);
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Installs the receiver of change notifications.
    pub fn set_observer(&mut self, observer: impl ImageObserver + 'static) {
        self.observer = Some(Box::new(observer));
    }

    pub(crate) fn notify(&mut self, area: Rect) {
        let (width, height) = self.dimensions();
        if let Some(observer) = self.observer.as_mut() {
            observer.image_changed(area, width, height);
        }
    }

    pub(crate) fn configure_instances(&mut self) {
        for instance in &mut self.instances {
            instance.on_configure(self.gamma, self.palette);
        }
    }

    /// Resizes the storage, honouring the user-requested size.
    ///
    /// Pixels inside both the old and the new bounds are kept, new pixels are
    /// transparent black. On failure the image is left untouched.
    pub(crate) fn resize_storage(&mut self, width: u32, height: u32) -> Result<()> {
        let width = if self.user_width > 0 { self.user_width } else { width };
        let height = if self.user_height > 0 { self.user_height } else { height };

        if (width, height) != self.dimensions() {
            let mut region = self.region.clone();
            region.intersect_rect(Rect::sized(width, height));
            let keep = region.clip_box();
            self.buffer.reallocate(width, height, keep)?;
            region.resize(width, height);
            self.region = region;

            if keep.x > 0 || keep.y > 0 {
                (self.dither_x, self.dither_y) = (0, 0);
            } else if keep.width == width {
                if keep.height < self.dither_y {
                    (self.dither_x, self.dither_y) = (0, keep.height);
                }
            } else if self.dither_y > 0 || keep.width < self.dither_x {
                (self.dither_x, self.dither_y) = (keep.width, 0);
            }

            self.flags.complex_alpha = has_complex_alpha(self.buffer.as_bytes());
        }

        self.resize_instances(width, height);
        Ok(())
    }

    pub(crate) fn resize_instances(&mut self, width: u32, height: u32) {
        for instance in &mut self.instances {
            instance.on_resize(width, height);
        }
    }

    /// Sets the image size; `MALLOC` if the storage cannot be allocated.
    pub fn set_size(&mut self, width: u32, height: u32) -> Result<()> {
        self.resize_storage(width, height)?;
        self.notify(Rect::empty());
        Ok(())
    }

    /// Grows the image so that it is at least `width` x `height`.
    pub fn expand(&mut self, width: u32, height: u32) -> Result<()> {
        if width <= self.width() && height <= self.height() {
            return Ok(());
        }
        self.resize_storage(width.max(self.width()), height.max(self.height()))?;
        self.notify(Rect::empty());
        Ok(())
    }

    /// Makes every pixel transparent black and clears all sticky flags.
    pub fn blank(&mut self) {
        (self.dither_x, self.dither_y) = (0, 0);
        self.flags = PhotoFlags::default();
        self.region.clear();
        self.buffer.clear();
        for instance in &mut self.instances {
            instance.on_reset_dither();
        }
        self.notify(self.buffer.bounds());
    }

    pub fn get_pixel(&self, x: u32, y: u32) -> Result<Rgba> {
        self.buffer
            .pixel(x, y)
            .ok_or(PhotoError::Coordinates("x or y"))
    }

    /// Alpha value of pixel `(x, y)`.
    pub fn alpha_at(&self, x: u32, y: u32) -> Result<u8> {
        self.get_pixel(x, y).map(|p| p.a)
    }

    /// True if pixel `(x, y)` is fully transparent.
    pub fn is_transparent(&self, x: u32, y: u32) -> Result<bool> {
        self.alpha_at(x, y).map(|a| a == 0)
    }

    /// Writes the alpha of a single pixel.
    pub fn set_transparency(&mut self, x: u32, y: u32, value: Transparency) -> Result<()> {
        let alpha = match value {
            Transparency::Transparent(true) => 0,
            Transparency::Transparent(false) => 255,
            Transparency::Alpha(a) => a,
        };
        let pixel = self
            .buffer
            .pixel_mut(x, y)
            .ok_or(PhotoError::Coordinates("x or y"))?;
        let previous = pixel.a;
        pixel.a = alpha;

        let rect = Rect::new(x as i32, y as i32, 1, 1);
        if alpha == 0 {
            self.region.subtract_rect(rect);
        } else {
            self.region.union_rect(rect);
        }

        if alpha != 0 && alpha != 255 {
            self.flags.complex_alpha = true;
        } else if self.flags.complex_alpha && previous != 0 && previous != 255 {
            self.flags.complex_alpha = has_complex_alpha(self.buffer.as_bytes());
        }

        self.notify(rect);
        Ok(())
    }

    /// Clips the `width` x `height` rectangle at `(x, y)` to the
    /// user-requested size and grows the storage to hold it. Returns `None`
    /// when the clipped rectangle is empty.
    fn reserve(&mut self, x: u32, y: u32, mut width: u32, mut height: u32) -> Result<Option<Rect>> {
        if self.user_width > 0 && x.saturating_add(width) > self.user_width {
            width = self.user_width.saturating_sub(x);
        }
        if self.user_height > 0 && y.saturating_add(height) > self.user_height {
            height = self.user_height.saturating_sub(y);
        }
        if width == 0 || height == 0 {
            return Ok(None);
        }

        let x_end = x
            .checked_add(width)
            .filter(|&end| end <= MAX_EXTENT)
            .ok_or(PhotoError::Malloc)?;
        let y_end = y
            .checked_add(height)
            .filter(|&end| end <= MAX_EXTENT)
            .ok_or(PhotoError::Malloc)?;
        if x_end > self.width() || y_end > self.height() {
            self.resize_storage(x_end.max(self.width()), y_end.max(self.height()))?;
            self.notify(Rect::empty());
        }
        Ok(Some(Rect::new(x as i32, y as i32, width, height)))
    }

    /// Validates `block` and reserves its destination. Returns the
    /// destination rectangle, or `None` when nothing is left to write.
    fn prepare_write(
        &mut self,
        block: &PhotoBlock<'_>,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    ) -> Result<Option<Rect>> {
        if block.is_empty() {
            return Ok(None);
        }
        block.validate()?;
        let Some(dest) = self.reserve(x, y, width, height)? else {
            return Ok(None);
        };

        if y < self.dither_y || (y == self.dither_y && x < self.dither_x) {
            (self.dither_x, self.dither_y) = (x, y);
        }
        if block.is_color() {
            self.flags.color_image = true;
        }
        Ok(Some(dest))
    }

    /// Updates the valid region and alpha classification after `dest` was
    /// written, then re-dithers and notifies.
    fn finish_write(&mut self, block: &PhotoBlock<'_>, dest: Rect, rule: CompositingRule) {
        let start = self.buffer.offset(dest.x as u32, dest.y as u32);
        if block.has_alpha() {
            if rule == CompositingRule::Set {
                self.region.subtract_rect(dest);
            }
            let pitch = self.buffer.pitch();
            self.region
                .union_alpha(dest, &self.buffer.as_bytes()[start + 3..], 4, pitch);
        } else {
            self.region.union_rect(dest);
        }

        // A single scanline only needs that scanline checked.
        if dest.height == 1 {
            if span_has_complex_alpha(self.buffer.as_bytes(), start, dest.width as usize) {
                self.flags.complex_alpha = true;
            } else if self.flags.complex_alpha {
                self.flags.complex_alpha = has_complex_alpha(self.buffer.as_bytes());
            }
        } else if block.has_alpha() || self.flags.complex_alpha {
            self.flags.complex_alpha = has_complex_alpha(self.buffer.as_bytes());
        }

        self.dither(dest);
        self.notify(dest);
    }

    /// Writes `block` into the `width` x `height` rectangle at `(x, y)`,
    /// growing the image as needed. A block smaller than the rectangle is
    /// tiled across it.
    pub fn put_block(
        &mut self,
        block: &PhotoBlock<'_>,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        rule: CompositingRule,
    ) -> Result<()> {
        let Some(dest) = self.prepare_write(block, x, y, width, height)? else {
            return Ok(());
        };
        trace!("put {}x{} block at {:?} ({})", block.width, block.height, dest, rule);
        blit(&mut self.buffer, block, dest, rule);
        self.finish_write(block, dest, rule);
        Ok(())
    }

    /// Like [`put_block`](Self::put_block), but subsamples and zooms the
    /// source on the way. Non-positive zoom writes nothing. A zero subsample
    /// samples no pixels, but the image still grows to hold the rectangle.
    #[allow(clippy::too_many_arguments)]
    pub fn put_zoomed_block(
        &mut self,
        block: &PhotoBlock<'_>,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        scale: Scale,
        rule: CompositingRule,
    ) -> Result<()> {
        if scale.is_identity() {
            return self.put_block(block, x, y, width, height, rule);
        }
        if scale.zoom_x <= 0 || scale.zoom_y <= 0 {
            return Ok(());
        }
        if scale.subsample_x == 0 || scale.subsample_y == 0 {
            self.reserve(x, y, width, height)?;
            return Ok(());
        }
        let Some(dest) = self.prepare_write(block, x, y, width, height)? else {
            return Ok(());
        };
        trace!("put {}x{} block at {:?} with {:?}", block.width, block.height, dest, scale);
        blit_zoomed(&mut self.buffer, block, dest, scale, rule);
        self.finish_write(block, dest, rule);
        Ok(())
    }

    /// Hands `area` to every display instance and advances the dither cursor
    /// when `area` continues the already dithered part in scan order.
    pub fn dither(&mut self, area: Rect) {
        let area = area.intersection(&self.buffer.bounds());
        if area.is_empty() {
            return;
        }
        for instance in &mut self.instances {
            instance.on_dither(&self.buffer, area);
        }

        let (x, y) = (area.x as u32, area.y as u32);
        let (dx, dy) = (self.dither_x, self.dither_y);
        if (y < dy || (y == dy && x <= dx)) && y + area.height > dy {
            if x == 0 && area.width == self.width() {
                (self.dither_x, self.dither_y) = (0, y + area.height);
            } else if x <= dx {
                self.dither_x = x + area.width;
                if self.dither_x >= self.width() {
                    self.dither_x = 0;
                    self.dither_y += 1;
                }
            }
        }
    }

    /// Dithers everything from the cursor to the end of the image.
    pub fn redither(&mut self) {
        let (x, y) = (self.dither_x, self.dither_y);
        let (width, height) = self.dimensions();
        if x != 0 {
            self.dither(Rect::new(x as i32, y as i32, width.saturating_sub(x), 1));
        }
        let mut changed_x = x;
        if self.dither_y < height {
            changed_x = 0;
            self.dither(Rect::new(0, self.dither_y as i32, width, height - self.dither_y));
        }
        if y < self.dither_y {
            self.notify(Rect::new(
                changed_x as i32,
                y as i32,
                width.saturating_sub(changed_x),
                self.dither_y - y,
            ));
        }
    }

    /// A zero-copy RGBA view of `area`; `BAD_FROM` if it leaves the image.
    pub fn view(&self, area: Rect) -> Result<PhotoBlock<'_>> {
        let (width, height) = self.dimensions();
        if area.x < 0
            || area.y < 0
            || area.x_max() > width as i32
            || area.y_max() > height as i32
        {
            return Err(PhotoError::BadFrom);
        }
        let start = if area.is_empty() {
            0
        } else {
            self.buffer.offset(area.x as u32, area.y as u32)
        };
        Ok(PhotoBlock {
            pixels: Cow::Borrowed(&self.buffer.as_bytes()[start..]),
            width: area.width,
            height: area.height,
            pitch: self.buffer.pitch(),
            pixel_size: 4,
            offset: [0, 1, 2],
            alpha: Some(3),
        })
    }

    /// Prepares `options.from` for an encoder.
    ///
    /// Alpha is dropped when every exported pixel is opaque, and colour
    /// offsets collapse to one channel when the image never held colour.
    /// Pixels are only copied when a background or grayscale conversion is
    /// requested and actually changes something.
    pub fn export(&self, options: &ExportOptions) -> Result<PhotoBlock<'_>> {
        let area = options.from.unwrap_or_else(|| self.buffer.bounds());
        let mut block = self.view(area)?;

        let opaque = (0..block.height).all(|y| {
            let row = &block.pixels[y as usize * block.pitch..][..block.width as usize * 4];
            row.chunks_exact(4).all(|p| p[3] == 255)
        });
        if opaque {
            block.alpha = None;
        }
        if !self.flags.color_image && options.background.is_none_or(|bg| bg.is_gray()) {
            block.offset = [0, 0, 0];
        }

        let has_alpha = block.has_alpha();
        let color = block.is_color();
        let background = options.background.filter(|_| has_alpha);
        if background.is_none() && !(options.grayscale && color) {
            return Ok(block);
        }

        let keep_alpha = has_alpha && background.is_none();
        let out_color = color && !options.grayscale;
        let pixel_size = if keep_alpha { 2 } else { 1 } + if out_color { 2 } else { 0 };
        let len = (block.width as usize)
            .checked_mul(block.height as usize)
            .and_then(|n| n.checked_mul(pixel_size))
            .ok_or(PhotoError::Malloc)?;
        let mut data = try_zeroed(len)?;

        let mut out = data.chunks_exact_mut(pixel_size);
        for y in 0..block.height {
            for x in 0..block.width {
                let [mut r, mut g, mut b, a] = block.rgba_at(x, y);
                if let Some(bg) = background {
                    r = blend(r, a, bg.r);
                    g = blend(g, a, bg.g);
                    b = blend(b, a, bg.b);
                }
                let Some(px) = out.next() else {
                    break;
                };
                if out_color {
                    px[..3].copy_from_slice(&[r, g, b]);
                } else {
                    px[0] = if color { luma(r, g, b) } else { r };
                }
                if keep_alpha {
                    px[pixel_size - 1] = a;
                }
            }
        }

        debug!(
            "exported {:?} as {} byte pixels (background {:?}, grayscale {})",
            area, pixel_size, options.background, options.grayscale
        );
        Ok(PhotoBlock {
            pitch: block.width as usize * pixel_size,
            pixels: Cow::Owned(data),
            width: block.width,
            height: block.height,
            pixel_size,
            offset: if out_color { [0, 1, 2] } else { [0, 0, 0] },
            alpha: keep_alpha.then_some(pixel_size - 1),
        })
    }
}

impl Drop for PhotoModel {
    fn drop(&mut self) {
        for instance in &mut self.instances {
            instance.on_dispose();
        }
        if !self.instances.is_empty() {
            debug!("disposed {} display instances", self.instances.len());
        }
    }
}

/// Alpha-weighted blend of `c` towards the background `bg`.
fn blend(c: u8, alpha: u8, bg: u8) -> u8 {
    let (c, a, bg) = (c as i32, alpha as i32, bg as i32);
    (bg + a * (c - bg) / 255) as u8
}

/// Integer luma used for grayscale export.
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((r as u32 * 11 + g as u32 * 16 + b as u32 * 5 + 16) >> 5) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn solid(width: u32, height: u32, rgba: [u8; 4]) -> PhotoBlock<'static> {
        PhotoBlock::rgba(rgba.repeat((width * height) as usize), width, height)
    }

    fn recorded(model: &mut PhotoModel) -> Rc<RefCell<Vec<(Rect, u32, u32)>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        model.set_observer(move |area: Rect, w: u32, h: u32| sink.borrow_mut().push((area, w, h)));
        log
    }

    #[test]
    fn put_grows_and_notifies_after_writing() {
        let mut model = PhotoModel::new();
        let log = recorded(&mut model);
        model
            .put_block(&solid(3, 2, [1, 2, 3, 255]), 1, 1, 3, 2, CompositingRule::Set)
            .unwrap();
        assert_eq!(model.dimensions(), (4, 3));
        assert_eq!(
            *log.borrow(),
            vec![(Rect::empty(), 4, 3), (Rect::new(1, 1, 3, 2), 4, 3)]
        );
        assert_eq!(model.valid_region().clip_box(), Rect::new(1, 1, 3, 2));
    }

    #[test]
    fn user_size_clips_writes() {
        let mut model = PhotoModel::new();
        model.user_width = 2;
        model
            .put_block(&solid(4, 1, [9, 9, 9, 255]), 0, 0, 4, 1, CompositingRule::Set)
            .unwrap();
        assert_eq!(model.dimensions(), (2, 1));
        model
            .put_block(&solid(1, 1, [9, 9, 9, 255]), 5, 0, 1, 1, CompositingRule::Set)
            .unwrap();
        assert_eq!(model.dimensions(), (2, 1));
    }

    #[test]
    fn failed_growth_changes_nothing() {
        let mut model = PhotoModel::new();
        model
            .put_block(&solid(2, 2, [1, 1, 1, 255]), 0, 0, 2, 2, CompositingRule::Set)
            .unwrap();
        let err = model
            .put_block(&solid(1, 1, [0, 0, 0, 255]), 70_000, 70_000, 1, 1, CompositingRule::Set)
            .unwrap_err();
        assert!(matches!(err, PhotoError::Malloc));
        assert_eq!(model.dimensions(), (2, 2));
        assert_eq!(model.get_pixel(1, 1).unwrap(), Rgba::opaque(1, 1, 1));
        assert_eq!(model.valid_region().len(), 4);
    }

    #[test]
    fn short_blocks_are_rejected() {
        let mut model = PhotoModel::new();
        let block = PhotoBlock::rgba(vec![0; 8], 2, 2);
        assert!(matches!(
            model.put_block(&block, 0, 0, 2, 2, CompositingRule::Set),
            Err(PhotoError::BadValue(_))
        ));
        assert_eq!(model.dimensions(), (0, 0));
    }

    #[test]
    fn set_with_alpha_rebuilds_region_from_alpha() {
        let mut model = PhotoModel::new();
        model
            .put_block(&solid(2, 1, [5, 5, 5, 255]), 0, 0, 2, 1, CompositingRule::Set)
            .unwrap();
        let block = PhotoBlock::rgba(vec![1, 1, 1, 0, 2, 2, 2, 10], 2, 1);
        model.put_block(&block, 0, 0, 2, 1, CompositingRule::Set).unwrap();
        assert!(!model.valid_region().contains(0, 0));
        assert!(model.valid_region().contains(1, 0));
        assert!(model.has_complex_alpha());

        model
            .put_block(&solid(2, 1, [5, 5, 5, 255]), 0, 0, 2, 1, CompositingRule::Set)
            .unwrap();
        assert!(!model.has_complex_alpha());
    }

    #[test]
    fn dither_cursor_follows_scan_order() {
        let mut model = PhotoModel::new();
        model.set_size(4, 4).unwrap();
        model
            .put_block(&solid(4, 2, [1, 1, 1, 255]), 0, 0, 4, 2, CompositingRule::Set)
            .unwrap();
        assert_eq!(model.dither_cursor(), (0, 2));

        model
            .put_block(&solid(2, 1, [1, 1, 1, 255]), 0, 2, 2, 1, CompositingRule::Set)
            .unwrap();
        assert_eq!(model.dither_cursor(), (2, 2));
        model
            .put_block(&solid(2, 1, [1, 1, 1, 255]), 2, 2, 2, 1, CompositingRule::Set)
            .unwrap();
        assert_eq!(model.dither_cursor(), (0, 3));

        // A write before the cursor pulls it back.
        model
            .put_block(&solid(1, 1, [1, 1, 1, 255]), 1, 0, 1, 1, CompositingRule::Set)
            .unwrap();
        assert_eq!(model.dither_cursor(), (2, 0));

        model.redither();
        assert_eq!(model.dither_cursor(), (0, 4));
    }

    #[test]
    fn resize_resets_cursor_by_kept_area() {
        let mut model = PhotoModel::new();
        model
            .put_block(&solid(4, 4, [1, 1, 1, 255]), 0, 0, 4, 4, CompositingRule::Set)
            .unwrap();
        assert_eq!(model.dither_cursor(), (0, 4));
        model.set_size(4, 2).unwrap();
        assert_eq!(model.dither_cursor(), (0, 2));
        // New columns on the right are undithered from the top.
        model.set_size(5, 2).unwrap();
        assert_eq!(model.dither_cursor(), (4, 0));
    }

    #[test]
    fn transparency_updates_region_and_classification() {
        let mut model = PhotoModel::new();
        model
            .put_block(&solid(2, 2, [7, 7, 7, 255]), 0, 0, 2, 2, CompositingRule::Set)
            .unwrap();
        let log = recorded(&mut model);

        model.set_transparency(1, 1, Transparency::Transparent(true)).unwrap();
        assert!(model.is_transparent(1, 1).unwrap());
        assert!(!model.valid_region().contains(1, 1));

        model.set_transparency(0, 1, Transparency::Alpha(40)).unwrap();
        assert_eq!(model.alpha_at(0, 1).unwrap(), 40);
        assert!(model.has_complex_alpha());
        model.set_transparency(0, 1, Transparency::Transparent(false)).unwrap();
        assert!(!model.has_complex_alpha());

        assert_eq!(log.borrow()[0], (Rect::new(1, 1, 1, 1), 2, 2));
        assert!(matches!(
            model.set_transparency(2, 0, Transparency::Alpha(1)),
            Err(PhotoError::Coordinates(_))
        ));
    }

    #[test]
    fn export_is_zero_copy_without_conversion() {
        let mut model = PhotoModel::new();
        model
            .put_block(&solid(2, 2, [10, 20, 30, 255]), 0, 0, 2, 2, CompositingRule::Set)
            .unwrap();
        let block = model.export(&ExportOptions::default()).unwrap();
        assert!(matches!(block.pixels, Cow::Borrowed(_)));
        assert_eq!(block.alpha, None);
        assert!(block.is_color());

        let gray = model
            .export(&ExportOptions {
                grayscale: true,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(gray.pixel_size, 1);
        assert_eq!(gray.rgba_at(1, 1), [18, 18, 18, 255]);
    }

    #[test]
    fn export_onto_background() {
        let mut model = PhotoModel::new();
        let block = PhotoBlock::rgba(vec![200, 100, 0, 255, 200, 100, 0, 0, 200, 100, 0, 51], 3, 1);
        model.put_block(&block, 0, 0, 3, 1, CompositingRule::Set).unwrap();

        let with_alpha = model.export(&ExportOptions::default()).unwrap();
        assert!(with_alpha.has_alpha());

        let out = model
            .export(&ExportOptions {
                background: Some(Rgb::new(0, 0, 100)),
                ..Default::default()
            })
            .unwrap();
        assert!(!out.has_alpha());
        assert_eq!(out.pixel_size, 3);
        assert_eq!(out.rgba_at(0, 0), [200, 100, 0, 255]);
        assert_eq!(out.rgba_at(1, 0), [0, 0, 100, 255]);
        assert_eq!(out.rgba_at(2, 0), [40, 20, 80, 255]);
    }

    #[test]
    fn export_outside_image_is_bad_from() {
        let model = PhotoModel::new();
        assert!(matches!(
            model.export(&ExportOptions {
                from: Some(Rect::new(0, 0, 1, 1)),
                ..Default::default()
            }),
            Err(PhotoError::BadFrom)
        ));
    }

    #[test]
    fn zero_subsample_grows_without_writing() {
        let mut model = PhotoModel::new();
        model
            .put_zoomed_block(
                &solid(2, 2, [255, 0, 0, 255]),
                0,
                0,
                4,
                3,
                Scale::new(1, 1, 0, 1),
                CompositingRule::Set,
            )
            .unwrap();
        assert_eq!(model.dimensions(), (4, 3));
        assert_eq!(model.get_pixel(0, 0).unwrap(), Rgba::new(0, 0, 0, 0));
        assert!(!model.is_color());
        assert!(model.region.clip_box().is_empty());
    }

    #[test]
    fn luma_weights() {
        assert_eq!(luma(255, 255, 255), 255);
        assert_eq!(luma(0, 0, 0), 0);
        assert_eq!(luma(255, 0, 0), 88);
    }
}
