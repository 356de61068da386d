//! Shared helpers for corgi's integration tests.
//!
//! - [`builders`]: job and graph builders with sensible defaults.
//! - [`fake_executor`]: an [`Executor`](corgi::exec::Executor) that records
//!   start/finish order instead of spawning processes.

pub mod builders;
pub mod fake_executor;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Install a tracing subscriber that writes through the test harness.
///
/// Output shows up only for failing tests unless run with `--nocapture`.
/// The filter comes from `RUST_LOG`, defaulting to `info`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Await `f`, panicking if it takes longer than five seconds.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    tokio::time::timeout(Duration::from_secs(5), f)
        .await
        .expect("test future did not complete within 5 seconds")
}
