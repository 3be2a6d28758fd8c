//! Violation Trait
//!
//! Common interface for everything the reporter prints: boundary
//! violations and artifact issues share ids, severities and locations.

use serde::Serialize;
use std::fmt::Display;
use std::path::PathBuf;

pub use super::Severity;

/// Category of violation for grouping in reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ViolationCategory {
    /// Import from a strictly higher layer
    Layering,
    /// Import matching a forbidden-dependency rule
    Dependency,
    /// Component specification artifacts
    Artifact,
}

impl Display for ViolationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Layering => write!(f, "Layering"),
            Self::Dependency => write!(f, "Dependency"),
            Self::Artifact => write!(f, "Artifact"),
        }
    }
}

/// Generic violation trait - all findings implement this
pub trait Violation: Display + Send + Sync {
    /// Unique violation ID (e.g., "GR-LAYER")
    fn id(&self) -> &str;

    /// Category for grouping in reports
    fn category(&self) -> ViolationCategory;

    /// Severity level
    fn severity(&self) -> Severity;

    /// File where violation occurred (if applicable)
    fn file(&self) -> Option<&PathBuf>;

    /// Line number where violation occurred (if applicable)
    fn line(&self) -> Option<usize>;

    /// Human-readable message describing the violation
    fn message(&self) -> String {
        self.to_string()
    }

    /// Suggested fix for the violation (if applicable)
    fn suggestion(&self) -> Option<String> {
        None
    }
}
