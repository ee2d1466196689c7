//! Hooks through which a photo image talks to the outside world.
//!
//! A `PhotoInstance` is one display-specific view of an image (for example a
//! window that dithers the image to its own palette). The image calls it when
//! its size, configuration or pixels change. An `ImageObserver` receives the
//! "this area changed" notifications that drive redisplay.

use crate::image::color::Palette;
use crate::image::geom::Rect;
use crate::image::pixel_buffer::PixelBuffer;

/// A display-side view of a photo image.
pub trait PhotoInstance {
    /// The image storage now has the given size.
    fn on_resize(&mut self, width: u32, height: u32);

    /// Gamma or palette changed.
    fn on_configure(&mut self, _gamma: f64, _palette: Palette) {}

    /// `area` of `pixels` must be re-rendered.
    fn on_dither(&mut self, pixels: &PixelBuffer, area: Rect);

    /// Dithering error state must be discarded; the image was blanked.
    fn on_reset_dither(&mut self) {}

    /// The image is going away.
    fn on_dispose(&mut self) {}
}

/// Receives change notifications. `area` is the part of the image that
/// changed; it may be empty when only the size changed.
pub trait ImageObserver {
    fn image_changed(&mut self, area: Rect, image_width: u32, image_height: u32);
}

impl<F> ImageObserver for F
where
    F: FnMut(Rect, u32, u32),
{
    fn image_changed(&mut self, area: Rect, image_width: u32, image_height: u32) {
        self(area, image_width, image_height)
    }
}
