//! Tests for artifact set validation

use crate::test_utils::create_component;
use guardrails::{ArtifactKind, ArtifactReport, ArtifactRulesConfig, ArtifactValidator, Reporter};
use std::fs;
use tempfile::TempDir;

fn validator() -> ArtifactValidator {
    ArtifactValidator::new(&ArtifactRulesConfig::default()).unwrap()
}

#[test]
fn test_complete_component_is_valid() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("Card");
    create_component(&dir, "Card");

    let result = validator().validate_component(&dir);
    assert!(result.valid, "{:?}", result.errors);
    assert!(result.warnings.is_empty(), "{:?}", result.warnings);
    assert_eq!(result.component_name, "Card");
    assert_eq!(result.spec_dir, dir);
}

#[test]
fn test_missing_registry_is_exactly_one_error() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("Card");
    create_component(&dir, "Card");
    fs::remove_file(dir.join("TESTIDS.json")).unwrap();

    let result = validator().validate_component(&dir);
    assert!(!result.valid);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].message.contains("TESTIDS.json"));
    assert!(result.errors[0].file.ends_with("TESTIDS.json"));

    let registry = result.document(ArtifactKind::TestIdRegistry).unwrap();
    assert!(!registry.present);
    let composition = result.document(ArtifactKind::Composition).unwrap();
    assert_eq!(composition.valid, Some(true));
}

#[test]
fn test_missing_field_at_depth_three_reported_with_path() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("Card");
    create_component(&dir, "Card");
    fs::write(
        dir.join("COMPOSITION.json"),
        r#"{
  "componentName": "Card",
  "root": {
    "componentRef": "Box",
    "children": [
      {
        "componentRef": "Stack",
        "children": [
          {
            "componentRef": "Row",
            "children": [
              { "slot": "icon", "role": "img" }
            ]
          }
        ]
      }
    ]
  }
}"#,
    )
    .unwrap();

    let result = validator().validate_component(&dir);
    assert!(!result.valid);
    assert_eq!(result.errors.len(), 1);
    let error = &result.errors[0];
    assert!(error.file.ends_with("COMPOSITION.json"));
    assert_eq!(
        error.path.as_deref(),
        Some("root.children[0].children[0].children[0].componentRef")
    );
}

#[test]
fn test_deeply_nested_composition_is_valid() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("Card");
    create_component(&dir, "Card");
    let mut node = r#"{"componentRef":"Text"}"#.to_string();
    for _ in 0..120 {
        node = format!(r#"{{"componentRef":"Box","children":[{node}]}}"#);
    }
    fs::write(
        dir.join("COMPOSITION.json"),
        format!(r#"{{"componentName":"Card","root":{node}}}"#),
    )
    .unwrap();

    let result = validator().validate_component(&dir);
    assert!(result.valid, "{:?}", result.errors);
    assert!(result.warnings.is_empty(), "{:?}", result.warnings);
}

#[test]
fn test_fail_slow_across_documents() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("Card");
    create_component(&dir, "Card");
    fs::write(dir.join("COMPOSITION.json"), "{ \"componentName\": ").unwrap();
    fs::write(
        dir.join("TESTIDS.json"),
        r#"{"componentName":"Card","testIds":[{"id":"a","element":"div"},{"id":"a","element":"span"}]}"#,
    )
    .unwrap();
    fs::write(dir.join("APPROVAL.json"), r#"{"componentName":"Card"}"#).unwrap();

    let result = validator().validate_component(&dir);
    let files: Vec<_> = result
        .errors
        .iter()
        .map(|e| e.file.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert!(files.contains(&"COMPOSITION.json".to_string()));
    assert!(files.contains(&"TESTIDS.json".to_string()));
    // version, status, workflow and the four arrays
    assert_eq!(files.iter().filter(|f| *f == "APPROVAL.json").count(), 7);
    assert!(result.errors.iter().any(|e| e.line == Some(1)));
}

#[test]
fn test_narrative_problems_are_warnings() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("Card");
    create_component(&dir, "Card");
    fs::write(
        dir.join("SPEC.md"),
        "# Card\n\n## Overview\n{{summary}}\n\n## Props\nTBD\n",
    )
    .unwrap();

    let result = validator().validate_component(&dir);
    assert!(result.valid);
    // four missing sections plus two placeholders
    assert_eq!(result.warnings.len(), 6);
    let lines: Vec<_> = result.warnings.iter().filter_map(|w| w.line).collect();
    assert_eq!(lines, vec![4, 7]);
}

#[test]
fn test_batch_isolates_malformed_component() {
    let temp = TempDir::new().unwrap();
    let names = ["Avatar", "Badge", "Card", "Dialog", "Empty"];
    for name in names {
        create_component(&temp.path().join(name), name);
    }
    fs::write(temp.path().join("Card/APPROVAL.json"), "not json at all").unwrap();
    fs::write(temp.path().join("Card/COMPOSITION.json"), "[]").unwrap();
    fs::remove_file(temp.path().join("Card/SPEC.md")).unwrap();

    let results = validator().validate_batch(temp.path()).unwrap();
    assert_eq!(results.len(), 5);
    for name in names {
        let result = &results[name];
        assert_eq!(result.component_name, name);
        assert_eq!(result.valid, name != "Card", "{name}: {:?}", result.errors);
    }
    assert_eq!(results["Card"].errors.len(), 3);

    let report = ArtifactReport::from_batch(results);
    assert_eq!(report.summary.invalid_count, 1);
    assert!(!report.summary.passed);
    let text = Reporter::artifacts_to_human_readable(&report, 0);
    assert!(text.contains("--- Card (INVALID, 3 errors, 0 warnings) ---"));
    assert!(text.contains("--- Dialog (valid, 0 errors, 0 warnings) ---"));
}

#[test]
fn test_custom_document_names() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("Card");
    create_component(&dir, "Card");
    fs::rename(dir.join("SPEC.md"), dir.join("README.md")).unwrap();

    let config = ArtifactRulesConfig {
        narrative_file: "README.md".to_string(),
        ..ArtifactRulesConfig::default()
    };
    let result = ArtifactValidator::new(&config).unwrap().validate_component(&dir);
    assert!(result.valid, "{:?}", result.errors);
}

#[test]
fn test_duplicate_document_names_rejected() {
    let config = ArtifactRulesConfig {
        approval_file: "TESTIDS.json".to_string(),
        ..ArtifactRulesConfig::default()
    };
    assert!(ArtifactValidator::new(&config).is_err());
}
