//! Process-wide logging setup shared by the API binary and tests.

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` controls filtering (defaults to `info`); `LOG_FORMAT=pretty`
/// switches from the default JSON lines to human-readable output. Calling
/// this more than once is harmless: later calls lose the
/// set-global-subscriber race and become no-ops.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false);

    if std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("pretty")) {
        let _ = builder.try_init();
    } else {
        let _ = builder.json().try_init();
    }
}
