//! Artifact Schema Validator
//!
//! Every UI component ships four documents next to its code:
//! - a narrative (markdown) with a fixed set of sections
//! - a composition graph describing how it nests other components
//! - a registry of the test ids it exposes
//! - an approval record tracking review
//!
//! Validation is fail-slow: all four files are checked for presence before
//! any content is read, and each document reports every problem it has.

pub mod approval_doc;
pub mod composition;
pub mod narrative;
pub mod schema;
pub mod testids;

use crate::config::ArtifactRulesConfig;
use crate::violation_trait::{Severity, Violation, ViolationCategory};
use crate::{GuardrailsError, Result};
use composition::CompositionDocument;
use rayon::prelude::*;
use schema::{FieldPath, Findings, from_value_deep, parse_json};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use testids::TestIdRegistry;
use tracing::{debug, info, warn};

/// The four documents of an artifact set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ArtifactKind {
    Narrative,
    Composition,
    TestIdRegistry,
    Approval,
}

impl ArtifactKind {
    pub const ALL: [Self; 4] = [
        Self::Narrative,
        Self::Composition,
        Self::TestIdRegistry,
        Self::Approval,
    ];

    pub fn file_name(self, config: &ArtifactRulesConfig) -> &str {
        match self {
            Self::Narrative => &config.narrative_file,
            Self::Composition => &config.composition_file,
            Self::TestIdRegistry => &config.testids_file,
            Self::Approval => &config.approval_file,
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Narrative => write!(f, "narrative"),
            Self::Composition => write!(f, "composition graph"),
            Self::TestIdRegistry => write!(f, "test-id registry"),
            Self::Approval => write!(f, "approval record"),
        }
    }
}

/// One problem found in an artifact document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactIssue {
    pub file: PathBuf,
    /// Dotted field path inside a structured document
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Line inside a text document or of a JSON syntax error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub message: String,
    pub severity: Severity,
}

impl std::fmt::Display for ArtifactIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.file.display())?;
        if let Some(line) = self.line {
            write!(f, ":{line}")?;
        }
        if let Some(path) = &self.path {
            write!(f, " at `{path}`")?;
        }
        write!(f, ": {}", self.message)
    }
}

impl Violation for ArtifactIssue {
    fn id(&self) -> &str {
        "GR-ARTIFACT"
    }

    fn category(&self) -> ViolationCategory {
        ViolationCategory::Artifact
    }

    fn severity(&self) -> Severity {
        self.severity
    }

    fn file(&self) -> Option<&PathBuf> {
        Some(&self.file)
    }

    fn line(&self) -> Option<usize> {
        self.line
    }

    fn message(&self) -> String {
        self.message.clone()
    }
}

/// Presence and verdict of one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentStatus {
    pub kind: ArtifactKind,
    pub file: PathBuf,
    pub present: bool,
    /// `None` when the document is missing
    pub valid: Option<bool>,
}

/// Validation result for one component's artifact set
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactValidation {
    pub valid: bool,
    pub errors: Vec<ArtifactIssue>,
    pub warnings: Vec<ArtifactIssue>,
    pub component_name: String,
    pub spec_dir: PathBuf,
    pub documents: Vec<DocumentStatus>,
}

impl ArtifactValidation {
    fn from_findings(
        component_name: String,
        spec_dir: PathBuf,
        documents: Vec<DocumentStatus>,
        issues: Vec<ArtifactIssue>,
    ) -> Self {
        let (errors, warnings): (Vec<_>, Vec<_>) = issues
            .into_iter()
            .partition(|issue| issue.severity == Severity::Error);
        Self {
            valid: errors.is_empty(),
            errors,
            warnings,
            component_name,
            spec_dir,
            documents,
        }
    }

    pub fn document(&self, kind: ArtifactKind) -> Option<&DocumentStatus> {
        self.documents.iter().find(|d| d.kind == kind)
    }
}

/// Validates artifact sets against the configured document names
pub struct ArtifactValidator {
    config: ArtifactRulesConfig,
}

impl ArtifactValidator {
    pub fn new(config: &ArtifactRulesConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: config.clone(),
        })
    }

    /// Validate one component directory. Never fails: unreadable or
    /// missing documents become errors in the result.
    pub fn validate_component(&self, dir: impl AsRef<Path>) -> ArtifactValidation {
        let dir = dir.as_ref();
        let component = component_name(dir);
        let mut issues = Vec::new();

        // Presence of all four first, so a caller sees every missing file.
        let mut present = Vec::new();
        let mut documents = Vec::new();
        for kind in ArtifactKind::ALL {
            let name = kind.file_name(&self.config);
            let file = dir.join(name);
            let is_present = file.is_file();
            if is_present {
                present.push((kind, file.clone()));
            } else {
                issues.push(ArtifactIssue {
                    file: file.clone(),
                    path: None,
                    line: None,
                    message: format!("required file missing: {name}"),
                    severity: Severity::Error,
                });
            }
            documents.push(DocumentStatus {
                kind,
                file,
                present: is_present,
                valid: None,
            });
        }

        let mut composition_doc = None;
        let mut registry = None;
        for (kind, file) in present {
            let mut findings = Findings::new(&file);
            match fs::read_to_string(&file) {
                Ok(text) => match kind {
                    ArtifactKind::Narrative => {
                        narrative::validate(&text, &self.config.required_sections, &mut findings);
                    }
                    ArtifactKind::Composition => {
                        if let Some(value) = parse_json(&text, &mut findings) {
                            composition::validate(&value, &component, &mut findings);
                            if !findings.has_errors() {
                                composition_doc = from_value_deep::<CompositionDocument>(&value)
                                    .ok()
                                    .map(|doc| (file.clone(), doc));
                            }
                        }
                    }
                    ArtifactKind::TestIdRegistry => {
                        if let Some(value) = parse_json(&text, &mut findings) {
                            testids::validate(&value, &component, &mut findings);
                            if !findings.has_errors() {
                                registry = serde_json::from_value::<TestIdRegistry>(value).ok();
                            }
                        }
                    }
                    ArtifactKind::Approval => {
                        if let Some(value) = parse_json(&text, &mut findings) {
                            approval_doc::validate(value, &component, &mut findings);
                        }
                    }
                },
                Err(err) => {
                    warn!(file = %file.display(), error = %err, "unreadable artifact");
                    findings.error(&FieldPath::root(), format!("unable to read file: {err}"));
                }
            }

            if let Some(status) = documents.iter_mut().find(|d| d.kind == kind) {
                status.valid = Some(!findings.has_errors());
            }
            issues.append(&mut findings.issues);
        }

        if let (Some((file, doc)), Some(registry)) = (composition_doc, registry) {
            issues.extend(unregistered_test_ids(&file, &doc, &registry));
        }

        let result = ArtifactValidation::from_findings(component, dir.to_path_buf(), documents, issues);
        debug!(
            component = %result.component_name,
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            "validated artifact set"
        );
        result
    }

    /// Validate every component directory under `parent`, in parallel.
    ///
    /// Plain files and directories whose names start with a skip prefix are
    /// ignored. One component's problems never affect another's result.
    pub fn validate_batch(
        &self,
        parent: impl AsRef<Path>,
    ) -> Result<BTreeMap<String, ArtifactValidation>> {
        let parent = parent.as_ref();
        if !parent.is_dir() {
            return Err(GuardrailsError::RootNotFound(parent.to_path_buf()));
        }

        let mut dirs = Vec::new();
        for entry in fs::read_dir(parent)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(dir = %parent.display(), error = %err, "skipping unreadable entry");
                    continue;
                }
            };
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();
            if !path.is_dir() {
                continue;
            }
            if self.is_skipped(&name) {
                debug!(dir = %path.display(), "skipping private component directory");
                continue;
            }
            dirs.push((name, path));
        }
        dirs.sort();

        info!(parent = %parent.display(), components = dirs.len(), "validating artifact sets");
        let results: BTreeMap<String, ArtifactValidation> = dirs
            .par_iter()
            .map(|(name, path)| (name.clone(), self.validate_component(path)))
            .collect();

        for (name, result) in &results {
            if !result.valid {
                warn!(component = %name, errors = result.errors.len(), "invalid artifact set");
            }
        }
        Ok(results)
    }

    fn is_skipped(&self, name: &str) -> bool {
        self.config
            .skip_prefixes
            .iter()
            .any(|prefix| !prefix.is_empty() && name.starts_with(prefix.as_str()))
    }
}

fn component_name(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| dir.display().to_string())
}

/// Test ids used by the composition tree that the registry does not list
fn unregistered_test_ids(
    file: &Path,
    doc: &CompositionDocument,
    registry: &TestIdRegistry,
) -> Vec<ArtifactIssue> {
    let registered: HashSet<&str> = registry.ids().collect();
    let mut findings = Findings::new(file);
    for (path, id) in doc.test_ids() {
        if !registered.contains(id) {
            findings.warning(
                &path.key("dataAttributes").key(composition::TEST_ID_ATTRIBUTE),
                format!("test id `{id}` is not listed in the test-id registry"),
            );
        }
    }
    findings.issues
}
