// src/utils/log.rs

//! Logging support for the photo engine.
//!
//! Library code logs through the `log` facade. Binaries and tests that want
//! to see the output install a backend once at start-up:
//!
//! ```
//! photo_engine::utils::log::init_logger(photo_engine::utils::log::LevelFilter::Debug);
//! ```
//!
//! Resizes, format matches and registry changes are logged at `debug`,
//! individual block writes at `trace`.

pub use log::{debug, error, info, trace, warn, LevelFilter};

/// Installs an `env_logger` backend writing to standard error.
///
/// `RUST_LOG` still overrides `max_level` for individual modules. Returns
/// `false` when a logger was already installed, in which case nothing changes.
pub fn init_logger(max_level: LevelFilter) -> bool {
    env_logger::Builder::new()
        .filter_level(max_level)
        .parse_default_env()
        .format_target(false)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_a_no_op() {
        init_logger(LevelFilter::Debug);
        assert!(!init_logger(LevelFilter::Trace));
    }
}
