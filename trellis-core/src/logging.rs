// Tracing setup and macro re-exports for the core

use tracing_subscriber::EnvFilter;

// Re-export tracing macros so core modules log through one path.
pub use tracing::{debug, error, info, trace, warn};

/// Install the default subscriber with an `info` filter.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init() {
    init_with_filter("info");
}

/// Install the default subscriber with explicit filter directives.
///
/// `TRELLIS_LOG` (standard `RUST_LOG` syntax) overrides `directives`
/// when set.
pub fn init_with_filter(directives: &str) {
    let filter = EnvFilter::try_from_env("TRELLIS_LOG")
        .unwrap_or_else(|_| EnvFilter::new(directives));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_init_is_idempotent() {
        super::init();
        super::init_with_filter("debug");
    }
}
