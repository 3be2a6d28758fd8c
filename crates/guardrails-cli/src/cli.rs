//! Command line interface definition

use clap::{Parser, Subcommand, ValueEnum};
use guardrails::{GuardrailsConfig, OutputFormat, ReportMode};
use std::path::PathBuf;

/// Layer-boundary and component-artifact checks for design-system monorepos
#[derive(Parser, Debug)]
#[command(name = "guardrails")]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (defaults to ./guardrails.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Report format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<FormatArg>,

    /// Print nothing; only the exit status reports the verdict
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Maximum findings listed per group (0 lists all)
    #[arg(long, global = true)]
    pub max_shown: Option<usize>,

    /// Log level (overridden by GUARDRAILS_LOG)
    #[arg(long, default_value = "warn", global = true)]
    pub log_level: String,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check import statements against the layer table and forbidden rules
    Boundaries {
        /// Root of the source tree
        #[arg(default_value = ".")]
        root: PathBuf,
    },
    /// Validate component artifact sets
    Artifacts {
        /// Component directory, or a parent of component directories with --batch
        dir: PathBuf,

        /// Validate every component directory under DIR
        #[arg(long)]
        batch: bool,
    },
    /// Print the effective configuration as TOML
    Config,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatArg {
    Human,
    Json,
    Ci,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Human => Self::Human,
            FormatArg::Json => Self::Json,
            FormatArg::Ci => Self::Ci,
        }
    }
}

impl Cli {
    /// Apply command-line overrides on top of the loaded configuration
    pub fn apply_overrides(&self, config: &mut GuardrailsConfig) {
        if let Some(format) = self.format {
            config.reporting.format = format.into();
        }
        if self.quiet {
            config.reporting.mode = ReportMode::Silent;
        }
        if let Some(max_shown) = self.max_shown {
            config.reporting.max_shown = max_shown;
        }
    }
}
