//! Test log output
//!
//! Installs a fmt subscriber writing through the test harness, filtered by
//! `RUST_LOG` (default `orbit_teardown=debug`).

use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call from every test.
pub fn init_test_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "orbit_teardown=debug".into()),
            )
            .with_test_writer()
            .try_init();
    });
}
