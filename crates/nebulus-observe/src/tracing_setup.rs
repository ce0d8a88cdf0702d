//! Tracing subscriber initialization.
//!
//! # Usage
//!
//! ```no_run
//! nebulus_observe::tracing_setup::init_tracing().unwrap();
//! ```

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initialize the global tracing subscriber.
///
/// Installs a structured `fmt` layer with target visibility and respects
/// `RUST_LOG` via `EnvFilter::from_default_env()`.
///
/// # Errors
///
/// Returns an error if a global subscriber has already been set.
pub fn init_tracing() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init()?;
    Ok(())
}

/// Like [`init_tracing`], but a no-op when a subscriber is already set.
///
/// Meant for test harnesses, where multiple tests race to initialize.
pub fn try_init_for_tests() {
    let _ = init_tracing();
}
