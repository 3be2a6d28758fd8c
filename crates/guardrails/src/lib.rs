//! Guardrails for a layered design-system monorepo
//!
//! This crate validates exactly two things:
//! - Cross-layer import legality (primitives < composed < blocks < patterns < shells < pages)
//!   plus a list of always-forbidden module paths
//! - The four specification artifacts that accompany every UI component
//!   (narrative, composition graph, test-id registry, approval record)
//!
//! It is a lightweight text scanner, not a parser or type checker.
//!
//! # Example
//!
//! ```ignore
//! use guardrails::{BoundaryChecker, BoundaryReport, GuardrailsConfig, Reporter};
//!
//! let config = GuardrailsConfig::load(None)?;
//! let checker = BoundaryChecker::new(&config.boundaries)?;
//! let run = checker.check_tree("packages/ui/src")?;
//! println!("{}", Reporter::to_human_readable(&BoundaryReport::from_run(&run), 0));
//! ```

// === Shared violation interface ===
pub mod violation_trait;

// === Configuration ===
pub mod config;

// === Source scanning ===
pub mod imports;
pub mod scan;
pub mod source;

// === Boundary rules ===
pub mod boundary;
pub mod layers;

// === Reporting ===
pub mod reporter;

// === Component artifacts ===
pub mod approval;
pub mod artifacts;

use std::path::PathBuf;
use thiserror::Error;

pub use approval::{
    ApprovalEntry, ApprovalPhase, ApprovalRecord, ApprovalStatus, Blocker, BlockerStatus,
    PhaseStatus, SourcePositions, WorkflowError, WorkflowFinding,
};
pub use artifacts::{
    ArtifactIssue, ArtifactKind, ArtifactValidation, ArtifactValidator, DocumentStatus,
};
pub use boundary::{BoundaryChecker, BoundaryViolation, IoFailure, ValidationRun, ViolationKind};
pub use config::{
    ArtifactRulesConfig, BoundaryRulesConfig, ForbiddenRule, GuardrailsConfig, LayerSpec,
    OutputFormat, ReportMode, ReportingConfig,
};
pub use imports::ImportReference;
pub use layers::{LayerAssignment, LayerTable};
pub use reporter::{ArtifactReport, BoundaryReport, Reporter};
pub use scan::{SourceWalker, WalkOutcome};
pub use source::{SourceFile, StrippedText, strip_comments, strip_source};
pub use violation_trait::{Violation, ViolationCategory};

/// Result type for guardrails operations
pub type Result<T> = std::result::Result<T, GuardrailsError>;

/// Errors that abort an invocation.
///
/// Findings about the codebase are never errors; they are collected into
/// [`ValidationRun`] and [`ArtifactValidation`].
#[derive(Error, Debug)]
pub enum GuardrailsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid regex pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid glob pattern: {0}")]
    InvalidGlob(#[from] globset::Error),

    #[error("Failed to load configuration: {0}")]
    Figment(#[from] Box<figment::Error>),

    #[error("Failed to render configuration: {0}")]
    Toml(#[from] toml::ser::Error),

    #[error("Scan root not found: {}", .0.display())]
    RootNotFound(PathBuf),
}

/// Severity level for findings
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "ERROR"),
            Self::Warning => write!(f, "WARNING"),
            Self::Info => write!(f, "INFO"),
        }
    }
}
