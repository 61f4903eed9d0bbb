//! Terminal logging for simulation runs
//!
//! `RUST_LOG` takes precedence over the level passed in, e.g.
//! `RUST_LOG=des=trace,littles_law=debug` to follow every resumed activity.

use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when `RUST_LOG` is unset
pub fn default_filter(level: &str) -> String {
    format!("des={level},littles_law={level}")
}

/// Install a stderr fmt subscriber. Returns false if one was already installed.
pub fn init_logging(level: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(level).into());

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true),
        )
        .with(filter)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_covers_engine_and_model() {
        assert_eq!(default_filter("warn"), "des=warn,littles_law=warn");
    }

    #[test]
    fn second_init_is_refused() {
        init_logging("error");
        assert!(!init_logging("error"));
    }
}
