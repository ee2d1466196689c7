// src/image/alpha.rs

//! Simple versus complex alpha classification.
//!
//! An image has simple alpha when every pixel is fully opaque or fully
//! transparent; displays can then draw it through a binary mask. Any alpha
//! byte strictly between 0 and 255 makes the alpha complex.

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// True if any pixel of an RGBA byte buffer has partial alpha.
pub fn has_complex_alpha(rgba: &[u8]) -> bool {
    #[cfg(feature = "rayon")]
    {
        rgba.par_chunks_exact(4).any(|p| p[3] != 0 && p[3] != 255)
    }
    #[cfg(not(feature = "rayon"))]
    {
        rgba.chunks_exact(4).any(|p| p[3] != 0 && p[3] != 255)
    }
}

/// True if any of `count` pixels starting at `offset` has partial alpha.
///
/// Used for single-scanline writes, where scanning the rest of the image
/// would be wasted work.
pub fn span_has_complex_alpha(rgba: &[u8], offset: usize, count: usize) -> bool {
    rgba[offset..offset + count * 4]
        .chunks_exact(4)
        .any(|p| p[3] != 0 && p[3] != 255)
}
