//! Tracing subscriber setup for the viewer binary

use tracing_subscriber::EnvFilter;

/// Directive used when neither `RUST_LOG` nor a configured level applies
pub const DEFAULT_DIRECTIVE: &str = "video_catalog=info,warn";

/// Build the filter: `RUST_LOG` wins, then `--verbose`, then the configured level
pub fn filter(level: Option<&str>, verbose: bool) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    let directive = if verbose {
        "video_catalog=debug,tower_http=debug,info".to_string()
    } else {
        match level {
            Some(level) if level.contains('=') => level.to_string(),
            Some(level) if !level.is_empty() => format!("video_catalog={},warn", level),
            _ => DEFAULT_DIRECTIVE.to_string(),
        }
    };

    EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init(level: Option<&str>, verbose: bool) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(level, verbose))
        .try_init();
}
