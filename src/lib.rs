//! A pixel compositing and storage engine for photo images.
//!
//! A [`PhotoModel`] holds a 32-bit RGBA image together with the bookkeeping
//! a display layer needs: which pixels hold real data, whether any pixel is
//! partially transparent, and how far display instances have dithered.
//! Pixel blocks in any byte layout are composited into it with the `set` or
//! `overlay` rule, optionally zoomed and subsampled. Image files and
//! in-memory data go through a pluggable [`FormatRegistry`].
//!
//! # Quick Start
//!
//! ```
//! use photo_engine::{CompositingRule, PhotoBlock, PhotoModel};
//!
//! let mut image = PhotoModel::new();
//! let red = PhotoBlock::rgb(vec![255, 0, 0], 1, 1);
//!
//! // Tiles the 1x1 block over a 10x10 area, growing the image to fit.
//! image.put_block(&red, 0, 0, 10, 10, CompositingRule::Set)?;
//! assert_eq!(image.dimensions(), (10, 10));
//! assert!(image.is_color());
//! # Ok::<(), photo_engine::PhotoError>(())
//! ```
//!
//! # Features
//!
//! - **Porter-Duff compositing**: `overlay` blends source over destination
//!   in 8-bit fixed point
//! - **Zoom and subsample**: nearest-neighbour scaling, with negative
//!   subsampling for mirrored copies
//! - **All-or-nothing resizing**: a failed allocation leaves the image as it
//!   was
//! - **Pluggable formats**: built-in `ppm` and list-of-rows `default` codecs
//! - **Optional parallelism**: enable the `rayon` feature for parallel alpha
//!   scans

// Core modules
pub mod format;
pub mod image;
pub mod photo;
pub mod utils;

// Image model and sessions
pub use photo::{
    Coords, ExportOptions, ImageObserver, OptionSet, PhotoInstance, PhotoModel, PhotoOptions,
    PhotoSession, SubcommandOptions, Transparency,
};

// Pixel types
pub use image::block::PhotoBlock;
pub use image::color::{Palette, Rgb, Rgba};
pub use image::compositor::{CompositingRule, Scale};
pub use image::geom::Rect;

// Formats
pub use format::{FormatRegistry, FormatSpec, Metadata, PhotoFormat};

// Error types
pub use utils::error::{ErrorCode, PhotoError, Result};

// Constants
pub const PHOTO_ENGINE_VERSION: &str = "0.1.0";
