pub mod token_counter;

use tracing_subscriber::EnvFilter;

/// Translate a config log level into an `EnvFilter` directive.
///
/// Returns `None` for `DISABLED`. `WARNING` and `CRITICAL` have no tracing
/// equivalent and map to `warn` and `error`. Unknown levels fall back to `info`.
#[must_use]
pub fn filter_directive(log_level: &str) -> Option<&'static str> {
    match log_level.trim().to_ascii_uppercase().as_str() {
        "DISABLED" => None,
        "DEBUG" => Some("debug"),
        "WARNING" | "WARN" => Some("warn"),
        "ERROR" | "CRITICAL" => Some("error"),
        _ => Some("info"),
    }
}

/// Install a global fmt subscriber for the configured log level.
///
/// Does nothing when logging is disabled or a subscriber is already set.
pub fn init_tracing(log_level: &str) {
    let Some(directive) = filter_directive(log_level) else {
        return;
    };

    let filter = EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directive_mapping() {
        assert_eq!(filter_directive("DISABLED"), None);
        assert_eq!(filter_directive("DEBUG"), Some("debug"));
        assert_eq!(filter_directive("INFO"), Some("info"));
        assert_eq!(filter_directive("WARNING"), Some("warn"));
        assert_eq!(filter_directive("ERROR"), Some("error"));
        assert_eq!(filter_directive("CRITICAL"), Some("error"));
    }

    #[test]
    fn test_filter_directive_is_case_insensitive() {
        assert_eq!(filter_directive("warning"), Some("warn"));
        assert_eq!(filter_directive(" disabled "), None);
        assert_eq!(filter_directive("verbose"), Some("info"));
    }

    #[test]
    fn test_init_tracing_twice_does_not_panic() {
        init_tracing("DEBUG");
        init_tracing("INFO");
    }
}
