//! Tests for configuration loading and fail-fast validation

use crate::test_utils::create_file_at_path;
use guardrails::{BoundaryChecker, GuardrailsConfig, OutputFormat, ReportMode};
use tempfile::TempDir;

#[test]
fn test_file_overrides_defaults() {
    let temp = TempDir::new().unwrap();
    create_file_at_path(
        temp.path(),
        "guardrails.toml",
        r#"
[boundaries]
extensions = ["ts"]

[[boundaries.layers]]
name = "core"
level = 0

[[boundaries.layers]]
name = "features"
level = 1

[reporting]
mode = "silent"
format = "ci"
"#,
    );

    let config = GuardrailsConfig::load(Some(&temp.path().join("guardrails.toml"))).unwrap();
    assert_eq!(config.boundaries.extensions, vec!["ts"]);
    assert_eq!(config.boundaries.layers.len(), 2);
    assert_eq!(config.boundaries.forbidden.len(), 3);
    assert_eq!(config.reporting.mode, ReportMode::Silent);
    assert_eq!(config.reporting.format, OutputFormat::Ci);
    assert_eq!(config.artifacts.testids_file, "TESTIDS.json");

    let checker = BoundaryChecker::new(&config.boundaries).unwrap();
    assert_eq!(checker.layers().layers()[1].name, "features");
}

#[test]
fn test_broken_configurations_fail_fast() {
    for toml in [
        "[boundaries]\nlayers = []\n",
        "[boundaries]\nforbidden = []\n",
        "[[boundaries.forbidden]]\npattern = \"(unclosed\"\nmessage = \"x\"\n",
        "[boundaries]\nallow = [\"[\"]\n",
        "[[boundaries.layers]]\nname = \"a\"\nlevel = 1\n[[boundaries.layers]]\nname = \"a\"\nlevel = 2\n",
    ] {
        assert!(GuardrailsConfig::from_toml_str(toml).is_err(), "{toml}");
    }
}
