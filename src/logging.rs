//! Logging initialisation.
//!
//! Noisy dependency targets (HTTP internals, the hub downloader) are held at
//! `warn` so the service's own startup and request logs stay readable.
//! Setting `RUST_LOG` replaces the whole filter.

use crate::config::LogFormat;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

pub const NOISY_MODULES: &[&str] = &["hyper", "hyper_util", "h2", "reqwest", "rustls", "hf_hub"];

fn filter_directives(log_level: &str) -> String {
    let mut directives = String::from(log_level);
    for module in NOISY_MODULES {
        directives.push_str(&format!(",{module}=warn"));
    }
    directives
}

fn build_filter(log_level: &str) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    EnvFilter::try_new(filter_directives(log_level))
        .unwrap_or_else(|_| EnvFilter::new(filter_directives("info")))
}

/// Installs the global subscriber. Calling it twice is harmless.
pub fn init_logging(log_level: &str, log_format: LogFormat) {
    let subscriber = tracing_subscriber::registry().with(build_filter(log_level));

    match log_format {
        LogFormat::Json => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_target(true);
            let _ = subscriber.with(fmt_layer).try_init();
        }
        LogFormat::Pretty => {
            let fmt_layer = tracing_subscriber::fmt::layer().with_target(true);
            let _ = subscriber.with(fmt_layer).try_init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noisy_modules_are_capped_at_warn() {
        let directives = filter_directives("debug");
        assert!(directives.starts_with("debug,"));
        assert!(directives.contains("hyper=warn"));
        assert!(directives.contains("hf_hub=warn"));
    }
}
