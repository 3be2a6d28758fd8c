//! Subcommand runners
//!
//! Each runner computes a result with the library, prints the selected
//! projection (unless silent) and returns whether the check passed.

use anyhow::{Context, Result};
use guardrails::{
    ArtifactReport, ArtifactValidator, BoundaryChecker, BoundaryReport, GuardrailsConfig,
    OutputFormat, ReportMode, Reporter,
};
use std::path::Path;
use tracing::info;

pub fn run_boundaries(config: &GuardrailsConfig, root: &Path) -> Result<bool> {
    let checker = BoundaryChecker::new(&config.boundaries)?;
    let run = checker
        .check_tree(root)
        .with_context(|| format!("boundary check of {} failed", root.display()))?;
    let report = BoundaryReport::from_run(&run);

    let reporting = &config.reporting;
    if reporting.mode == ReportMode::Verbose {
        let output = match reporting.format {
            OutputFormat::Human => Reporter::to_human_readable(&report, reporting.max_shown),
            OutputFormat::Json => Reporter::to_json(&report),
            OutputFormat::Ci => Reporter::to_ci_summary(&report),
        };
        println!("{output}");
    }
    Ok(run.passed)
}

pub fn run_artifacts(config: &GuardrailsConfig, dir: &Path, batch: bool) -> Result<bool> {
    let validator = ArtifactValidator::new(&config.artifacts)?;
    let reporting = &config.reporting;

    let (report, json) = if batch {
        let results = validator
            .validate_batch(dir)
            .with_context(|| format!("cannot read component directory {}", dir.display()))?;
        let json = Reporter::to_json(&results);
        (ArtifactReport::from_batch(results), json)
    } else {
        if !dir.is_dir() {
            anyhow::bail!("component directory not found: {}", dir.display());
        }
        let result = validator.validate_component(dir);
        let json = Reporter::to_json(&result);
        (ArtifactReport::from_single(result), json)
    };
    info!(
        components = report.summary.component_count,
        invalid = report.summary.invalid_count,
        "Artifact validation finished"
    );

    if reporting.mode == ReportMode::Verbose {
        let output = match reporting.format {
            OutputFormat::Human => {
                Reporter::artifacts_to_human_readable(&report, reporting.max_shown)
            }
            OutputFormat::Json => json,
            OutputFormat::Ci => Reporter::artifacts_to_ci_summary(&report),
        };
        println!("{output}");
    }
    Ok(report.summary.passed)
}

pub fn print_config(config: &GuardrailsConfig) -> Result<()> {
    print!("{}", config.to_toml_string()?);
    Ok(())
}
