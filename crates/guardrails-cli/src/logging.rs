//! Structured logging with tracing
//!
//! Logs go to stderr so stdout carries nothing but the report.

use anyhow::{Result, bail};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable holding an `EnvFilter` directive
pub const LOG_ENV: &str = "GUARDRAILS_LOG";

/// Initialize logging; `GUARDRAILS_LOG` takes precedence over `level`
pub fn init_logging(level: &str, json: bool) -> Result<()> {
    let level = parse_log_level(level)?;
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level));

    // Layer types differ, hence the two branches
    if json {
        let stderr = fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true);
        tracing_subscriber::registry().with(filter).with(stderr).try_init()?;
    } else {
        let stderr = fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .with_target(true);
        tracing_subscriber::registry().with(filter).with(stderr).try_init()?;
    }

    tracing::debug!(level, "Logging initialized");
    Ok(())
}

/// Normalize a log level name
pub fn parse_log_level(level: &str) -> Result<&'static str> {
    Ok(match level.to_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "info" => "info",
        "warn" | "warning" => "warn",
        "error" => "error",
        "off" => "off",
        _ => bail!("Invalid log level: {level}. Use trace, debug, info, warn, error or off"),
    })
}
