//! Pixel-level building blocks: geometry, colours, storage, the valid-pixel
//! region and the compositing kernels that combine them.

pub mod alpha;
pub mod block;
pub mod color;
pub mod compositor;
pub mod geom;
pub mod pixel_buffer;
pub mod region;
