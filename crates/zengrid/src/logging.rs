//! Subscriber setup for native hosts and tests.
//!
//! The engine only emits `tracing` events. Browser hosts route them through
//! their own subscriber; everything else can call [`init`].

use tracing_subscriber::EnvFilter;

/// Environment variable holding the filter directives.
pub const LOG_ENV: &str = "ZENGRID_LOG";

/// Filter used when neither the environment nor the caller sets one.
pub const DEFAULT_FILTER: &str = "warn";

/// Installs a fmt subscriber filtered by `ZENGRID_LOG`, else `default_filter`,
/// else [`DEFAULT_FILTER`].
///
/// Returns `false` if a global subscriber was already installed; calling it
/// twice is harmless.
pub fn init(default_filter: Option<&str>) -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(default_filter.unwrap_or(DEFAULT_FILTER)))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}

/// Like [`init`] but writes through the test harness's capture.
pub fn init_for_tests() -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init()
        .is_ok()
}
