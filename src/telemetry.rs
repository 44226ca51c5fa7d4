//! Tracing and diagnostics setup for binaries and examples.
//!
//! Library code only emits; installing a subscriber is the embedding
//! application's call. [`init_tracing`] is the one-liner for demos and
//! integration tests.

use tracing_error::ErrorLayer;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install a global `tracing` subscriber with env-filter support.
///
/// `RUST_LOG` wins when set; otherwise engine events log at `info`.
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_file(false)
        .with_line_number(false);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,dagwire=info"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(ErrorLayer::default())
        .try_init();
}

/// Install miette's pretty panic reports alongside tracing.
pub fn init_diagnostics() {
    miette::set_panic_hook();
    init_tracing();
}
