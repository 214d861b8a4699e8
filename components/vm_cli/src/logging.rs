//! Log subscriber setup for the launcher binary.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs a stderr `fmt` subscriber.
///
/// `RUST_LOG` wins when set; otherwise `verbose` picks the level for the
/// VM crates.
pub fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn,bootstrap=info,vm_cli=info",
        1 => "info,bootstrap=debug,vm_cli=debug",
        _ => "debug,bootstrap=trace,vm_cli=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // A subscriber may already be installed when embedded in tests.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
