//! Logging utilities
//!
//! Provides logging setup and configuration.

use env_logger::{Builder, Env};

const DEFAULT_FILTER: &str = "info";
const QUIET_FILTER: &str = "warn";

/// Setup logging for the server.
///
/// `RUST_LOG` always wins; otherwise `quiet` lowers the default to warnings.
pub fn setup_logging(quiet: bool) {
    let default_filter = if quiet { QUIET_FILTER } else { DEFAULT_FILTER };
    Builder::from_env(Env::default().default_filter_or(default_filter))
        .format_timestamp_millis()
        .init();
}
