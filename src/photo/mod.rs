//! Photo images: the image model, its configuration, the pixel transfer
//! operations of the photo subcommands, and sessions of named images.

pub mod configure;
pub mod instance;
pub mod model;
pub mod options;
pub mod session;
pub mod transfer;

pub use configure::PhotoOptions;
pub use instance::{ImageObserver, PhotoInstance};
pub use model::{ExportOptions, PhotoFlags, PhotoModel, Transparency};
pub use options::{Coords, OptionSet, SubcommandOptions};
pub use session::PhotoSession;
