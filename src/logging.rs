//! Logging setup
//!
//! Installs a `tracing` subscriber. `RUST_LOG` wins when set; otherwise the
//! config's `debug` flag picks between `debug` and `info` for this crate.

use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;

/// Default filter directive for a given debug setting
pub fn default_directive(debug: bool) -> &'static str {
    if debug {
        "guestbook_notifier=debug,info"
    } else {
        "guestbook_notifier=info,warn"
    }
}

/// Initialize logging from config. Safe to call more than once; only the
/// first call installs a subscriber.
pub fn init_logging(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(config.debug)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Log debug message with component context
#[macro_export]
macro_rules! debug_context {
    ($context:expr, $($arg:tt)*) => {
        tracing::debug!(component = $context, "{}", format_args!($($arg)*))
    };
}
