use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

/// Environment variable holding the log filter, e.g. `MOB_LOG=mob=debug`
pub const LOG_ENV: &str = "MOB_LOG";

/// Initialize structured logging on stderr.
///
/// Diagnostics stay off stdout, which carries the user-facing output.
/// `--debug` forces the `debug` level regardless of `MOB_LOG`.
pub fn init_telemetry(debug: bool) -> Result<()> {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(filter)
        .try_init()
        .context("Failed to initialize logging")?;

    tracing::debug!("Logging initialized");
    Ok(())
}

/// Generate a correlation ID for linking the log lines of one invocation
pub fn generate_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Span wrapping one command invocation
pub fn create_command_span(command: &str, correlation_id: &str) -> tracing::Span {
    tracing::info_span!(
        "mob_command",
        command = command,
        correlation.id = correlation_id,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correlation_ids_are_unique_uuids() {
        let first = generate_correlation_id();
        let second = generate_correlation_id();
        assert_ne!(first, second);
        assert!(Uuid::parse_str(&first).is_ok());
    }
}
