//! Validation Report Generation
//!
//! Generates reports in multiple formats:
//! - JSON for embedding in other tools
//! - Human-readable for terminal output
//! - CI summary for GitHub Actions annotations
//!
//! Every format is a projection of an already computed result; nothing
//! here re-runs a check or writes to the console.

use crate::artifacts::ArtifactValidation;
use crate::boundary::{BoundaryViolation, IoFailure, ValidationRun, ViolationKind};
use crate::violation_trait::{Severity, Violation};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::PathBuf;

/// Boundary check result prepared for presentation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundaryReport {
    /// Timestamp of the report
    pub timestamp: String,
    /// Scan root
    pub root: PathBuf,
    #[serde(flatten)]
    pub summary: BoundarySummary,
    pub violations: Vec<BoundaryViolation>,
    pub io_errors: Vec<IoFailure>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundarySummary {
    pub total_violations: usize,
    /// Count per violation kind
    pub by_kind: BTreeMap<ViolationKind, usize>,
    pub files_scanned: usize,
    pub files_walked: usize,
    pub files_exempt: usize,
    pub passed: bool,
}

impl BoundaryReport {
    pub fn from_run(run: &ValidationRun) -> Self {
        let by_kind = run
            .by_kind()
            .into_iter()
            .map(|(kind, violations)| (kind, violations.len()))
            .collect();
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            root: run.root.clone(),
            summary: BoundarySummary {
                total_violations: run.violations.len(),
                by_kind,
                files_scanned: run.files_scanned,
                files_walked: run.files_walked,
                files_exempt: run.files_exempt,
                passed: run.passed,
            },
            violations: run.violations.clone(),
            io_errors: run.io_errors.clone(),
        }
    }

    /// Violations grouped by kind, in a fixed kind order
    pub fn grouped(&self) -> BTreeMap<ViolationKind, Vec<&BoundaryViolation>> {
        let mut groups: BTreeMap<ViolationKind, Vec<&BoundaryViolation>> = BTreeMap::new();
        for v in &self.violations {
            groups.entry(v.kind).or_default().push(v);
        }
        groups
    }
}

/// Artifact validation results for one or many components
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactReport {
    pub timestamp: String,
    #[serde(flatten)]
    pub summary: ArtifactSummary,
    pub components: BTreeMap<String, ArtifactValidation>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactSummary {
    pub component_count: usize,
    pub invalid_count: usize,
    pub error_count: usize,
    pub warning_count: usize,
    pub passed: bool,
}

impl ArtifactReport {
    pub fn from_single(result: ArtifactValidation) -> Self {
        let mut components = BTreeMap::new();
        components.insert(result.component_name.clone(), result);
        Self::from_batch(components)
    }

    pub fn from_batch(components: BTreeMap<String, ArtifactValidation>) -> Self {
        let invalid_count = components.values().filter(|c| !c.valid).count();
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            summary: ArtifactSummary {
                component_count: components.len(),
                invalid_count,
                error_count: components.values().map(|c| c.errors.len()).sum(),
                warning_count: components.values().map(|c| c.warnings.len()).sum(),
                passed: invalid_count == 0,
            },
            components,
        }
    }
}

/// Report generator
pub struct Reporter;

impl Reporter {
    /// Generate JSON for any report or raw result
    pub fn to_json<T: Serialize + ?Sized>(report: &T) -> String {
        serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string())
    }

    /// Generate human-readable boundary report.
    ///
    /// `max_shown` caps the violations listed per kind (0 lists all);
    /// counts always cover every violation.
    pub fn to_human_readable(report: &BoundaryReport, max_shown: usize) -> String {
        let mut output = String::new();
        let summary = &report.summary;

        output.push_str("=== Boundary Validation Report ===\n\n");
        let _ = writeln!(output, "Timestamp: {}", report.timestamp);
        let _ = writeln!(output, "Root: {}\n", report.root.display());

        output.push_str("--- Summary ---\n");
        let _ = writeln!(output, "Files walked:   {}", summary.files_walked);
        let _ = writeln!(output, "Files scanned:  {}", summary.files_scanned);
        let _ = writeln!(output, "Files exempt:   {}", summary.files_exempt);
        let _ = writeln!(output, "Violations:     {}", summary.total_violations);
        for (kind, count) in &summary.by_kind {
            let _ = writeln!(output, "  {:<18}{count}", format!("{kind}:"));
        }
        let _ = writeln!(output, "I/O errors:     {}\n", report.io_errors.len());
        let _ = writeln!(output, "Status: {}\n", status(summary.passed));

        for (kind, violations) in report.grouped() {
            let _ = writeln!(output, "--- {kind} ({}) ---", violations.len());
            write_violations(&mut output, violations, max_shown);
            output.push('\n');
        }

        if !report.io_errors.is_empty() {
            let _ = writeln!(output, "--- I/O Errors ({}) ---", report.io_errors.len());
            for failure in &report.io_errors {
                let _ = writeln!(output, "  {}: {}", failure.path.display(), failure.message);
            }
            output.push('\n');
        }

        output
    }

    /// Generate CI summary (GitHub Actions format)
    pub fn to_ci_summary(report: &BoundaryReport) -> String {
        let mut output = String::new();
        let summary = &report.summary;

        output.push_str("## Boundary Validation\n\n");
        output.push_str(&status_badge(summary.passed));

        output.push_str("| Kind | Count |\n");
        output.push_str("|------|-------|\n");
        for kind in [ViolationKind::LayerViolation, ViolationKind::ForbiddenImport] {
            let count = summary.by_kind.get(&kind).copied().unwrap_or(0);
            let _ = writeln!(output, "| {kind} | {count} |");
        }
        let _ = writeln!(output, "| I/O errors | {} |", report.io_errors.len());
        let _ = writeln!(output, "| **Total** | **{}** |", summary.total_violations);
        output.push('\n');

        let mut annotations: Vec<String> = report.violations.iter().map(annotation).collect();
        annotations.extend(report.io_errors.iter().map(|failure| {
            format!(
                "::error file={},title=GR-IO::{}",
                escape_property(&failure.path.display().to_string()),
                escape_data(&failure.message)
            )
        }));
        write_annotations(&mut output, &annotations);

        output
    }

    /// Generate human-readable artifact report
    pub fn artifacts_to_human_readable(report: &ArtifactReport, max_shown: usize) -> String {
        let mut output = String::new();
        let summary = &report.summary;

        output.push_str("=== Artifact Validation Report ===\n\n");
        let _ = writeln!(output, "Timestamp: {}\n", report.timestamp);
        output.push_str("--- Summary ---\n");
        let _ = writeln!(output, "Components:     {}", summary.component_count);
        let _ = writeln!(output, "Invalid:        {}", summary.invalid_count);
        let _ = writeln!(output, "Errors:         {}", summary.error_count);
        let _ = writeln!(output, "Warnings:       {}\n", summary.warning_count);
        let _ = writeln!(output, "Status: {}\n", status(summary.passed));

        for (name, result) in &report.components {
            let verdict = if result.valid { "valid" } else { "INVALID" };
            let _ = writeln!(
                output,
                "--- {name} ({verdict}, {} errors, {} warnings) ---",
                result.errors.len(),
                result.warnings.len()
            );
            let _ = writeln!(output, "  Directory: {}", result.spec_dir.display());
            write_violations(&mut output, result.errors.iter(), max_shown);
            write_violations(&mut output, result.warnings.iter(), max_shown);
            output.push('\n');
        }

        output
    }

    /// Generate CI summary for artifact results
    pub fn artifacts_to_ci_summary(report: &ArtifactReport) -> String {
        let mut output = String::new();

        output.push_str("## Artifact Validation\n\n");
        output.push_str(&status_badge(report.summary.passed));

        output.push_str("| Component | Valid | Errors | Warnings |\n");
        output.push_str("|-----------|-------|--------|----------|\n");
        for (name, result) in &report.components {
            let valid = if result.valid { "yes" } else { "no" };
            let _ = writeln!(
                output,
                "| {name} | {valid} | {} | {} |",
                result.errors.len(),
                result.warnings.len()
            );
        }
        output.push('\n');

        let annotations: Vec<String> = report
            .components
            .values()
            .flat_map(|result| result.errors.iter().chain(&result.warnings))
            .map(annotation)
            .collect();
        write_annotations(&mut output, &annotations);

        output
    }

    /// Count error-level findings in a boundary report
    pub fn count_errors(report: &BoundaryReport) -> usize {
        report
            .violations
            .iter()
            .filter(|v| v.severity() == Severity::Error)
            .count()
            + report.io_errors.len()
    }
}

fn status(passed: bool) -> &'static str {
    if passed { "PASSED" } else { "FAILED" }
}

fn status_badge(passed: bool) -> String {
    if passed {
        "**Status:** :white_check_mark: PASSED\n\n".to_string()
    } else {
        "**Status:** :x: FAILED\n\n".to_string()
    }
}

fn write_violations<'a, V: Violation + 'a>(
    output: &mut String,
    violations: impl IntoIterator<Item = &'a V>,
    max_shown: usize,
) {
    let mut hidden = 0;
    for (i, v) in violations.into_iter().enumerate() {
        if max_shown > 0 && i >= max_shown {
            hidden += 1;
            continue;
        }
        let _ = writeln!(output, "  [{}] {}", v.severity(), v);
        if let Some(suggestion) = v.suggestion() {
            let _ = writeln!(output, "    suggestion: {suggestion}");
        }
    }
    if hidden > 0 {
        let _ = writeln!(output, "  ... and {hidden} more");
    }
}

fn write_annotations(output: &mut String, annotations: &[String]) {
    if annotations.is_empty() {
        return;
    }
    output.push_str("### Findings\n\n");
    for a in annotations {
        output.push_str(a);
        output.push('\n');
    }
}

/// One workflow command line, e.g. `::error file=a.ts,line=3,title=GR-LAYER::msg`
fn annotation<V: Violation>(v: &V) -> String {
    let command = match v.severity() {
        Severity::Error => "error",
        Severity::Warning => "warning",
        Severity::Info => "notice",
    };
    let mut properties = Vec::new();
    if let Some(file) = v.file() {
        properties.push(format!("file={}", escape_property(&file.display().to_string())));
    }
    if let Some(line) = v.line() {
        properties.push(format!("line={line}"));
    }
    properties.push(format!("title={}", v.id()));
    format!("::{command} {}::{}", properties.join(","), escape_data(&v.message()))
}

fn escape_data(s: &str) -> String {
    s.replace('%', "%25").replace('\r', "%0D").replace('\n', "%0A")
}

fn escape_property(s: &str) -> String {
    escape_data(s).replace(':', "%3A").replace(',', "%2C")
}
