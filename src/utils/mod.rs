//! General-purpose utility modules.

pub mod error;
pub mod list;
pub mod log;

// Re-export commonly used items
pub use error::{ErrorCode, PhotoError, Result};
