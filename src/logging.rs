//! Logging bootstrap
//!
//! The crate logs through the `log` facade. Hosts that do not install their
//! own logger can call [`init`], which sets up `env_logger` honouring
//! `RUST_LOG` and falling back to `info` (or `debug`).

use log::LevelFilter;

/// Install `env_logger` as the global logger.
///
/// Returns an error if a logger was already installed.
pub fn init(debug: bool) -> Result<(), log::SetLoggerError> {
    let default = if debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).try_init()
}

/// Logger for tests: captured by the test harness, safe to call repeatedly.
pub fn try_init_for_tests() {
    let _ = env_logger::Builder::new()
        .filter_level(LevelFilter::Debug)
        .is_test(true)
        .try_init();
}
