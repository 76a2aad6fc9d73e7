//! Tracing setup for hosts that do not install their own subscriber.

use tracing_subscriber::EnvFilter;

/// Default directives keep third-party HTTP chatter down unless `RUST_LOG`
/// says otherwise.
const DEFAULT_DIRECTIVES: &str = "info,hyper=warn,reqwest=warn";

/// Install a formatted subscriber with env-filter support. Safe to call
/// more than once; later calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init();
}
