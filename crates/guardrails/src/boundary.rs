//! Boundary Rule Engine
//!
//! Two independent rule families run on every extracted import:
//! - layer direction: a classified file may not import a module path whose
//!   layer sits strictly higher in the table
//! - forbidden dependencies: module paths matching a configured pattern are
//!   rejected regardless of layer
//!
//! A single import can trigger both; both are reported.

use crate::config::{BoundaryRulesConfig, ForbiddenRule, compile_rule};
use crate::imports::{ImportReference, extract_imports};
use crate::layers::{LayerAssignment, LayerTable};
pub use crate::scan::IoFailure;
use crate::scan::{SourceWalker, relative_to};
use crate::source::SourceFile;
use crate::violation_trait::{Severity, Violation, ViolationCategory};
use crate::{GuardrailsError, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use rayon::prelude::*;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Which rule family produced a violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ViolationKind {
    LayerViolation,
    ForbiddenImport,
}

impl std::fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LayerViolation => write!(f, "Layer Violations"),
            Self::ForbiddenImport => write!(f, "Forbidden Imports"),
        }
    }
}

/// A single boundary finding; never mutated after creation
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundaryViolation {
    pub file: PathBuf,
    pub line: usize,
    pub kind: ViolationKind,
    pub message: String,
    pub offending_import: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_layer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_layer: Option<String>,
    /// Pattern of the forbidden rule that matched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
}

impl BoundaryViolation {
    fn layer(import: &ImportReference, source: &LayerAssignment, target: &LayerAssignment) -> Self {
        Self {
            file: import.source_file.clone(),
            line: import.line,
            kind: ViolationKind::LayerViolation,
            message: format!(
                "Layer `{}` ({}) imports `{}` from higher layer `{}` ({})",
                source.layer, source.level, import.module_path, target.layer, target.level
            ),
            offending_import: import.module_path.clone(),
            source_layer: Some(source.layer.clone()),
            target_layer: Some(target.layer.clone()),
            rule: None,
        }
    }

    fn forbidden(
        import: &ImportReference,
        source: Option<&LayerAssignment>,
        rule: &ForbiddenRule,
    ) -> Self {
        Self {
            file: import.source_file.clone(),
            line: import.line,
            kind: ViolationKind::ForbiddenImport,
            message: format!("Forbidden import `{}`: {}", import.module_path, rule.message),
            offending_import: import.module_path.clone(),
            source_layer: source.map(|s| s.layer.clone()),
            target_layer: None,
            rule: Some(rule.pattern.clone()),
        }
    }
}

impl std::fmt::Display for BoundaryViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}: {}", self.file.display(), self.line, self.message)
    }
}

impl Violation for BoundaryViolation {
    fn id(&self) -> &str {
        match self.kind {
            ViolationKind::LayerViolation => "GR-LAYER",
            ViolationKind::ForbiddenImport => "GR-FORBIDDEN",
        }
    }

    fn category(&self) -> ViolationCategory {
        match self.kind {
            ViolationKind::LayerViolation => ViolationCategory::Layering,
            ViolationKind::ForbiddenImport => ViolationCategory::Dependency,
        }
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn file(&self) -> Option<&PathBuf> {
        Some(&self.file)
    }

    fn line(&self) -> Option<usize> {
        Some(self.line)
    }

    fn message(&self) -> String {
        self.message.clone()
    }

    fn suggestion(&self) -> Option<String> {
        match self.kind {
            ViolationKind::LayerViolation => Some(format!(
                "Move the shared code down to `{}` or below, or compose it from a higher layer",
                self.source_layer.as_deref().unwrap_or("this layer")
            )),
            ViolationKind::ForbiddenImport => {
                Some("Depend on the package's public entry point instead".to_string())
            }
        }
    }
}

/// Result of one boundary check over a tree
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRun {
    pub root: PathBuf,
    pub violations: Vec<BoundaryViolation>,
    /// Files read and checked (exempt files excluded)
    pub files_scanned: usize,
    /// Every file with a recognized extension
    pub files_walked: usize,
    pub files_exempt: usize,
    /// Unreadable files and directories
    pub io_errors: Vec<IoFailure>,
    pub passed: bool,
}

impl ValidationRun {
    /// Violations grouped by kind
    pub fn by_kind(&self) -> BTreeMap<ViolationKind, Vec<&BoundaryViolation>> {
        let mut groups: BTreeMap<ViolationKind, Vec<&BoundaryViolation>> = BTreeMap::new();
        for v in &self.violations {
            groups.entry(v.kind).or_default().push(v);
        }
        groups
    }

    pub fn count(&self, kind: ViolationKind) -> usize {
        self.violations.iter().filter(|v| v.kind == kind).count()
    }
}

struct CompiledRule {
    rule: ForbiddenRule,
    regex: Regex,
}

enum FileOutcome {
    Exempt,
    Checked(Vec<BoundaryViolation>),
    Unreadable(IoFailure),
}

/// Evaluates both rule families over files or whole trees
pub struct BoundaryChecker {
    layers: LayerTable,
    rules: Vec<CompiledRule>,
    allow: GlobSet,
    walker: SourceWalker,
}

impl BoundaryChecker {
    /// Validate the configuration and compile every rule.
    ///
    /// Fails before any file is touched when the configuration is broken.
    pub fn new(config: &BoundaryRulesConfig) -> Result<Self> {
        config.validate()?;

        let layers = LayerTable::new(&config.layers)?;
        let rules = config
            .forbidden
            .iter()
            .map(|rule| {
                Ok(CompiledRule {
                    rule: rule.clone(),
                    regex: compile_rule(rule)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut allow = GlobSetBuilder::new();
        for pattern in &config.allow {
            allow.add(Glob::new(pattern)?);
        }

        Ok(Self {
            layers,
            rules,
            allow: allow.build()?,
            walker: SourceWalker::new(config),
        })
    }

    pub fn layers(&self) -> &LayerTable {
        &self.layers
    }

    /// Whether a path (relative to the scan root) is on the allow-list
    pub fn is_exempt(&self, relative: &Path) -> bool {
        self.allow.is_match(relative)
    }

    /// Check one in-memory source file
    pub fn check_source(&self, file: &SourceFile) -> Vec<BoundaryViolation> {
        self.check_imports(&file.relative, &extract_imports(file))
    }

    /// Apply both rule families to the imports of one file
    pub fn check_imports(
        &self,
        relative: &Path,
        imports: &[ImportReference],
    ) -> Vec<BoundaryViolation> {
        let source_layer = self.layers.classify_path(relative);
        let mut violations = Vec::new();

        for import in imports {
            if let Some(source) = &source_layer {
                if let Some(target) = self.layers.classify_module(&import.module_path) {
                    if target.level > source.level {
                        violations.push(BoundaryViolation::layer(import, source, &target));
                    }
                }
            }

            for compiled in &self.rules {
                if compiled.regex.is_match(&import.module_path) {
                    violations.push(BoundaryViolation::forbidden(
                        import,
                        source_layer.as_ref(),
                        &compiled.rule,
                    ));
                }
            }
        }
        violations
    }

    /// Walk `root` and check every non-exempt source file.
    ///
    /// Files are checked in parallel; the merged violations are sorted so
    /// repeated runs over an unchanged tree produce identical output.
    pub fn check_tree(&self, root: impl AsRef<Path>) -> Result<ValidationRun> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(GuardrailsError::RootNotFound(root.to_path_buf()));
        }
        info!(root = %root.display(), "Starting boundary check");

        let walk = self.walker.walk(root);
        let outcomes: Vec<FileOutcome> = walk
            .files
            .par_iter()
            .map(|path| self.check_path(root, path))
            .collect();

        let mut violations = Vec::new();
        let mut io_errors = walk.errors;
        let mut files_scanned = 0;
        let mut files_exempt = 0;
        for outcome in outcomes {
            match outcome {
                FileOutcome::Exempt => files_exempt += 1,
                FileOutcome::Checked(found) => {
                    files_scanned += 1;
                    violations.extend(found);
                }
                FileOutcome::Unreadable(failure) => io_errors.push(failure),
            }
        }
        violations.sort();
        io_errors.sort_by(|a, b| a.path.cmp(&b.path));

        let passed = violations.is_empty() && io_errors.is_empty();
        info!(
            files_scanned,
            files_exempt,
            violations = violations.len(),
            io_errors = io_errors.len(),
            passed,
            "Boundary check finished"
        );

        Ok(ValidationRun {
            root: root.to_path_buf(),
            violations,
            files_scanned,
            files_walked: walk.files.len(),
            files_exempt,
            io_errors,
            passed,
        })
    }

    fn check_path(&self, root: &Path, path: &Path) -> FileOutcome {
        if self.is_exempt(&relative_to(root, path)) {
            debug!(file = %path.display(), "Exempt from boundary rules");
            return FileOutcome::Exempt;
        }
        match SourceFile::read(root, path) {
            Ok(file) => FileOutcome::Checked(self.check_source(&file)),
            Err(err) => {
                warn!(file = %path.display(), error = %err, "Cannot read source file");
                FileOutcome::Unreadable(IoFailure {
                    path: path.to_path_buf(),
                    message: err.to_string(),
                })
            }
        }
    }
}
