//! Configuration Module
//!
//! Provides file-based configuration for guardrails, allowing projects to
//! customize the layer table, forbidden-dependency rules, exemptions and
//! artifact conventions via `guardrails.toml`.
//!
//! Sources are merged in this order (later sources override earlier):
//! 1. Default values from `GuardrailsConfig::default()`
//! 2. TOML configuration file (explicit path, or `guardrails.toml` in the
//!    working directory when present)

use crate::{GuardrailsError, Result};
use figment::Figment;
use figment::providers::{Format, Serialized, Toml};
use globset::Glob;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILENAME: &str = "guardrails.toml";

/// Complete guardrails configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardrailsConfig {
    /// Layer table, forbidden rules and walker settings
    pub boundaries: BoundaryRulesConfig,
    /// Artifact file names and narrative conventions
    pub artifacts: ArtifactRulesConfig,
    /// Output mode and format
    pub reporting: ReportingConfig,
}

/// One layer of the hierarchy; lower level = more foundational
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub name: String,
    pub level: u32,
}

impl LayerSpec {
    pub fn new(name: impl Into<String>, level: u32) -> Self {
        Self {
            name: name.into(),
            level,
        }
    }
}

/// A module-path pattern that is always disallowed, with its rationale
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForbiddenRule {
    /// Regular expression tested against the literal module path
    pub pattern: String,
    /// Human-readable rationale shown with each violation
    pub message: String,
}

impl ForbiddenRule {
    pub fn new(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            message: message.into(),
        }
    }
}

/// Layer-direction and forbidden-dependency settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundaryRulesConfig {
    /// Recognized source extensions (without the dot)
    pub extensions: Vec<String>,
    /// Directory names never descended into, at any depth
    pub skip_dirs: Vec<String>,
    /// Glob patterns (relative to the scan root) of exempt files
    pub allow: Vec<String>,
    /// Recursion guard for the tree walk
    pub max_depth: usize,
    /// Follow symbolic links; cycles are then reported as I/O errors
    pub follow_links: bool,
    /// Ordered layer table
    pub layers: Vec<LayerSpec>,
    /// Forbidden-dependency rules, evaluated in order
    pub forbidden: Vec<ForbiddenRule>,
}

impl Default for BoundaryRulesConfig {
    fn default() -> Self {
        let layers = ["primitives", "composed", "blocks", "patterns", "shells", "pages"]
            .into_iter()
            .zip(0..)
            .map(|(name, level)| LayerSpec::new(name, level))
            .collect();

        Self {
            layers,
            forbidden: vec![
                ForbiddenRule::new(
                    r"^@[\w.-]+/[\w.-]+/(src|lib|dist)/",
                    "Deep import into another package's internals; import from the package entry point",
                ),
                ForbiddenRule::new(
                    r"(^|/)internal(/|$)",
                    "Internal modules are private to their package",
                ),
                ForbiddenRule::new(
                    r"^@[\w.-]+/(domain|api|store|services)(-[\w.-]+)?(/|$)",
                    "Design-system components must not depend on application domain packages",
                ),
            ],
            extensions: ["ts", "tsx", "js", "jsx", "mjs", "cjs"]
                .into_iter()
                .map(String::from)
                .collect(),
            skip_dirs: [
                "node_modules",
                "dist",
                "build",
                ".git",
                "coverage",
                "storybook-static",
                ".storybook",
                "stories",
                "__stories__",
                "examples",
                ".next",
                ".turbo",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            allow: [
                "**/*.stories.*",
                "**/*.generated.*",
                "**/__generated__/**",
                "**/*.wrapper.ts",
                "**/*.wrapper.tsx",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            max_depth: 64,
            follow_links: false,
        }
    }
}

/// Conventions for the per-component artifact set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactRulesConfig {
    pub narrative_file: String,
    pub composition_file: String,
    pub testids_file: String,
    pub approval_file: String,
    /// Headings every narrative document should contain
    pub required_sections: Vec<String>,
    /// Directory-name prefixes skipped in batch mode (private/template)
    pub skip_prefixes: Vec<String>,
}

impl Default for ArtifactRulesConfig {
    fn default() -> Self {
        Self {
            narrative_file: "SPEC.md".to_string(),
            composition_file: "COMPOSITION.json".to_string(),
            testids_file: "TESTIDS.json".to_string(),
            approval_file: "APPROVAL.json".to_string(),
            required_sections: [
                "Overview",
                "Anatomy",
                "Props",
                "States",
                "Accessibility",
                "Test IDs",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            skip_prefixes: vec!["_".to_string(), ".".to_string()],
        }
    }
}

/// Silent (programmatic) or verbose (human-readable) reporting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportMode {
    #[default]
    Verbose,
    Silent,
}

/// Projection used for verbose output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
    Ci,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportingConfig {
    pub mode: ReportMode,
    pub format: OutputFormat,
    /// Maximum violations listed per group; 0 lists all
    pub max_shown: usize,
}

impl GuardrailsConfig {
    /// Load configuration from defaults merged with an optional TOML file.
    ///
    /// An explicit `path` must exist. Without one, `guardrails.toml` in the
    /// working directory is used when present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) if !p.exists() => {
                return Err(GuardrailsError::Config(format!(
                    "Configuration file not found: {}",
                    p.display()
                )));
            }
            Some(p) => Some(p.to_path_buf()),
            None => Self::find_default_config_path(),
        };
        Self::load_from(file.as_deref())
    }

    fn load_from(file: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(file) = file {
            info!("Configuration loaded from {}", file.display());
            figment = figment.merge(Toml::file(file));
        } else {
            debug!("No configuration file, using defaults");
        }

        let config: Self = figment.extract().map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string merged over the defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::string(content))
            .extract()
            .map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    /// Render the effective configuration as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    fn find_default_config_path() -> Option<PathBuf> {
        let candidate = std::env::current_dir().ok()?.join(DEFAULT_CONFIG_FILENAME);
        candidate.is_file().then_some(candidate)
    }

    /// Reject configurations that indicate a broken invocation.
    ///
    /// Runs before any file is scanned.
    pub fn validate(&self) -> Result<()> {
        self.boundaries.validate()?;
        self.artifacts.validate()
    }
}

impl BoundaryRulesConfig {
    pub fn validate(&self) -> Result<()> {
        if self.layers.is_empty() {
            return Err(config_error("layer table is empty"));
        }

        let mut names = HashSet::new();
        let mut levels = HashSet::new();
        for layer in &self.layers {
            if layer.name.trim().is_empty() {
                return Err(config_error("layer name cannot be empty"));
            }
            if layer.name.contains('/') {
                return Err(config_error(format!(
                    "layer name `{}` must be a single path segment",
                    layer.name
                )));
            }
            if !names.insert(layer.name.as_str()) {
                return Err(config_error(format!("duplicate layer name `{}`", layer.name)));
            }
            if !levels.insert(layer.level) {
                return Err(config_error(format!(
                    "duplicate layer level {} (layer `{}`)",
                    layer.level, layer.name
                )));
            }
        }

        if self.forbidden.is_empty() {
            return Err(config_error("forbidden-dependency rule set is empty"));
        }
        for rule in &self.forbidden {
            compile_rule(rule)?;
        }

        for pattern in &self.allow {
            Glob::new(pattern)?;
        }

        if self.extensions.is_empty() {
            return Err(config_error("no source extensions configured"));
        }
        if self.max_depth == 0 {
            return Err(config_error("max_depth must be at least 1"));
        }
        Ok(())
    }
}

impl ArtifactRulesConfig {
    pub fn validate(&self) -> Result<()> {
        let names = self.file_names();
        let mut seen = HashSet::new();
        for name in names {
            if name.trim().is_empty() {
                return Err(config_error("artifact file names cannot be empty"));
            }
            if !seen.insert(name) {
                return Err(config_error(format!("artifact file `{name}` configured twice")));
            }
        }
        Ok(())
    }

    /// The four expected document names, in report order
    pub fn file_names(&self) -> [&str; 4] {
        [
            self.narrative_file.as_str(),
            self.composition_file.as_str(),
            self.testids_file.as_str(),
            self.approval_file.as_str(),
        ]
    }
}

/// Compile a forbidden rule's pattern, rejecting empty patterns
pub(crate) fn compile_rule(rule: &ForbiddenRule) -> Result<Regex> {
    if rule.pattern.is_empty() {
        return Err(config_error("forbidden rule pattern cannot be empty"));
    }
    Regex::new(&rule.pattern).map_err(|source| GuardrailsError::InvalidPattern {
        pattern: rule.pattern.clone(),
        source,
    })
}

fn config_error(message: impl Into<String>) -> GuardrailsError {
    GuardrailsError::Config(message.into())
}
