//! Tracing subscriber setup for the binary
//!
//! `RUST_LOG` wins when set; otherwise the configured level, shifted by the
//! CLI verbosity flags. Output goes to stderr so answers stay clean on stdout.

use tracing_subscriber::EnvFilter;

use crate::cli::Verbosity;

/// Effective level after applying verbosity flags
pub fn effective_level(configured: &str, verbosity: Verbosity) -> &'static str {
    match verbosity {
        Verbosity::Quiet => "error",
        Verbosity::VeryVerbose => "trace",
        Verbosity::Verbose => match configured {
            "trace" => "trace",
            _ => "debug",
        },
        Verbosity::Normal => match configured {
            "error" => "error",
            "info" => "info",
            "debug" => "debug",
            "trace" => "trace",
            _ => "warn",
        },
    }
}

/// Install the global subscriber; later calls are no-ops
pub fn init(configured_level: &str, verbosity: Verbosity) {
    let level = effective_level(configured_level, verbosity);
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("docquery={}", level)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
