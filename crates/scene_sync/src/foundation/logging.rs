//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system from `RUST_LOG`
///
/// Calling this more than once is harmless; later calls leave the first
/// logger in place.
pub fn init() {
    let _ = env_logger::try_init();
}

/// Initialize the logging system with a default level
///
/// `RUST_LOG` still takes precedence when it is set. The level string uses the
/// `env_logger` filter syntax, e.g. `"info"` or `"scene_sync=debug"`.
pub fn init_with_level(level: &str) -> Result<(), log::SetLoggerError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_initialization_is_refused() {
        init();
        init();
        assert!(init_with_level("debug").is_err());
        debug!("logger installed");
    }
}
