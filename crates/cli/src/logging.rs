use std::time::Duration;

use graphkit_domain::GraphError;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const QUIET_FILTER: &str = "graphkit=info,graphkit_infra=info,graphkit_common=info,warn";
const VERBOSE_FILTER: &str = "graphkit=debug,graphkit_infra=debug,graphkit_common=debug,info";

/// Install the global subscriber. `RUST_LOG` wins over `verbose`.
///
/// Logs go to stderr so stdout stays valid JSON.
pub fn init_cli_logger(verbose: bool, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

    let (compact, json) = if json {
        let layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .json();
        (None, Some(layer))
    } else {
        let layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .compact();
        (Some(layer), None)
    };

    tracing_subscriber::registry().with(filter).with(compact).with(json).init();
}

fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        VERBOSE_FILTER
    } else {
        QUIET_FILTER
    }
}

/// Log the outcome of a subcommand with structured fields.
pub fn log_command_execution(command: &str, elapsed: Duration, error: Option<&GraphError>) {
    let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

    match error {
        None => info!(command, duration_ms, "command_execution_success"),
        Some(err) => {
            warn!(command, duration_ms, error_type = error_label(err), "command_execution_failure");
        }
    }
}

/// Stable label for an error kind, safe to log.
pub fn error_label(error: &GraphError) -> &'static str {
    match error {
        GraphError::Config(_) => "config",
        GraphError::Network(_) => "network",
        GraphError::Auth(_) => "auth",
        GraphError::Security(_) => "security",
        GraphError::NotFound(_) => "not_found",
        GraphError::InvalidInput(_) => "invalid_input",
        GraphError::RateLimited(_) => "rate_limited",
        GraphError::Api { .. } => "api",
        GraphError::Storage(_) => "storage",
        GraphError::Internal(_) => "internal",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_raises_crate_levels() {
        assert!(default_directives(true).starts_with("graphkit=debug"));
        assert!(default_directives(false).starts_with("graphkit=info"));
        EnvFilter::try_new(default_directives(true)).unwrap();
        EnvFilter::try_new(default_directives(false)).unwrap();
    }

    #[test]
    fn labels_are_stable() {
        assert_eq!(error_label(&GraphError::Auth("x".into())), "auth");
        assert_eq!(error_label(&GraphError::Api { status: 500, message: String::new() }), "api");
        assert_eq!(error_label(&GraphError::RateLimited("slow".into())), "rate_limited");
    }
}
