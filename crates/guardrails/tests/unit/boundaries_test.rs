//! Tests for the boundary rule engine over real trees

use crate::test_utils::{create_file_at_path, create_layered_tree};
use guardrails::{
    BoundaryChecker, BoundaryReport, BoundaryRulesConfig, ForbiddenRule, GuardrailsError,
    Reporter, SourceFile, ViolationKind,
};
use std::collections::HashSet;
use std::path::Path;
use tempfile::TempDir;

fn checker() -> BoundaryChecker {
    BoundaryChecker::new(&BoundaryRulesConfig::default()).unwrap()
}

#[test]
fn test_clean_tree_passes() {
    let temp = create_layered_tree();
    let run = checker().check_tree(temp.path()).unwrap();
    assert!(run.passed, "{:?}", run.violations);
    assert_eq!(run.files_scanned, 4);
    assert_eq!(run.files_walked, 4);
    assert!(run.io_errors.is_empty());
}

#[test]
fn test_primitives_importing_composed_is_exactly_one_violation() {
    let temp = TempDir::new().unwrap();
    create_file_at_path(
        temp.path(),
        "primitives/Box.tsx",
        "import { Card } from '../composed/Card';\n",
    );
    create_file_at_path(
        temp.path(),
        "composed/Card.tsx",
        "import { Box } from '../primitives/Box';\n",
    );

    let run = checker().check_tree(temp.path()).unwrap();
    assert_eq!(run.violations.len(), 1);
    let v = &run.violations[0];
    assert_eq!(v.kind, ViolationKind::LayerViolation);
    assert!(v.file.ends_with("primitives/Box.tsx"));
    assert!(!run.passed);
}

#[test]
fn test_unclassified_files_never_get_layer_violations() {
    let temp = TempDir::new().unwrap();
    let imports_everything = "import a from '../primitives/A';\n\
         import b from '../composed/B';\n\
         import c from '../blocks/C';\n\
         import d from '../patterns/D';\n\
         import e from '../shells/E';\n\
         import f from '../pages/F';\n";
    create_file_at_path(temp.path(), "utils/everything.ts", imports_everything);
    create_file_at_path(temp.path(), "hooks/useAll.ts", imports_everything);

    let run = checker().check_tree(temp.path()).unwrap();
    assert_eq!(run.count(ViolationKind::LayerViolation), 0);
    assert!(run.passed);
}

#[test]
fn test_forbidden_imports_reported_in_every_layer() {
    let temp = TempDir::new().unwrap();
    let forbidden = "import { api } from '@acme/api-client';\n";
    for file in [
        "primitives/A.tsx",
        "composed/B.tsx",
        "blocks/C.tsx",
        "patterns/D.tsx",
        "shells/E.tsx",
        "pages/F.tsx",
        "lib/G.ts",
    ] {
        create_file_at_path(temp.path(), file, forbidden);
    }

    let run = checker().check_tree(temp.path()).unwrap();
    assert_eq!(run.count(ViolationKind::ForbiddenImport), 7);
    assert_eq!(run.count(ViolationKind::LayerViolation), 0);
}

#[test]
fn test_one_import_reported_under_both_families() {
    let temp = TempDir::new().unwrap();
    create_file_at_path(
        temp.path(),
        "primitives/Box.tsx",
        "import { secret } from '../patterns/internal/secret';\n",
    );

    let run = checker().check_tree(temp.path()).unwrap();
    let kinds: Vec<_> = run.violations.iter().map(|v| v.kind).collect();
    assert_eq!(
        kinds,
        vec![ViolationKind::LayerViolation, ViolationKind::ForbiddenImport]
    );
    assert!(run.violations.iter().all(|v| v.line == 1));
}

#[test]
fn test_repeated_runs_are_identical() {
    let temp = create_layered_tree();
    create_file_at_path(
        temp.path(),
        "primitives/Icon.tsx",
        "import { Page } from '../pages/Home';\nimport x from '@acme/store';\n",
    );
    create_file_at_path(
        temp.path(),
        "composed/Menu.tsx",
        "const Shell = require('../shells/AppShell');\n",
    );

    let c = checker();
    let first = c.check_tree(temp.path()).unwrap();
    let second = c.check_tree(temp.path()).unwrap();
    assert_eq!(first.violations, second.violations);

    let as_set: HashSet<_> = first.violations.iter().collect();
    assert_eq!(as_set.len(), first.violations.len());
    assert_eq!(first.violations.len(), 3);
}

#[test]
fn test_line_numbers_survive_comment_stripping() {
    let mut text = String::from("/**\n * Primitive box.\n *\n * Spans several lines.\n */\n");
    while text.lines().count() < 41 {
        text.push_str("// filler comment with 'quote\n");
    }
    text.push_str("import { Card } from '../composed/Card'; /* trailing */\n");

    let temp = TempDir::new().unwrap();
    create_file_at_path(temp.path(), "primitives/Box.tsx", &text);
    let run = checker().check_tree(temp.path()).unwrap();

    assert_eq!(run.violations.len(), 1);
    assert_eq!(run.violations[0].line, 42);
}

#[test]
fn test_commented_out_imports_ignored() {
    let file = SourceFile::new(
        "primitives/Box.tsx",
        "// import { Card } from '../composed/Card';\n/* import x from '@acme/domain'; */\n",
    );
    assert!(checker().check_source(&file).is_empty());
}

#[test]
fn test_usage_snippets_in_strings_are_not_imports() {
    let file = SourceFile::new(
        "primitives/Box.tsx",
        concat!(
            "export const usage = `import { Page } from '../pages/Home';`;\n",
            "export const legacy = \"const x = require('@acme/api-client');\";\n",
        ),
    );
    assert!(checker().check_source(&file).is_empty());
}

#[test]
fn test_exempt_files_skipped_but_walked() {
    let temp = create_layered_tree();
    create_file_at_path(
        temp.path(),
        "primitives/Box/Box.stories.tsx",
        "import { Page } from '../../pages/Home';\n",
    );
    create_file_at_path(
        temp.path(),
        "primitives/Box/Box.wrapper.tsx",
        "import { Radix } from '@acme/api/src/thing';\n",
    );

    let run = checker().check_tree(temp.path()).unwrap();
    assert!(run.passed);
    assert_eq!(run.files_walked, 6);
    assert_eq!(run.files_exempt, 2);
    assert_eq!(run.files_scanned, 4);
}

#[test]
fn test_skip_dirs_never_entered() {
    let temp = create_layered_tree();
    create_file_at_path(
        temp.path(),
        "node_modules/pkg/primitives/index.js",
        "require('../pages/x');\n",
    );
    create_file_at_path(temp.path(), "primitives/dist/Box.js", "import '../pages/x';\n");

    let run = checker().check_tree(temp.path()).unwrap();
    assert!(run.passed);
    assert_eq!(run.files_walked, 4);
}

#[test]
fn test_custom_rules() {
    let mut config = BoundaryRulesConfig::default();
    config.forbidden = vec![ForbiddenRule::new("^lodash$", "Use lodash-es")];
    let c = BoundaryChecker::new(&config).unwrap();

    let v = c.check_source(&SourceFile::new("pages/A.tsx", "import _ from 'lodash';\n"));
    assert_eq!(v.len(), 1);
    assert_eq!(v[0].rule.as_deref(), Some("^lodash$"));
    assert!(v[0].message.contains("Use lodash-es"));
}

#[test]
fn test_missing_root_is_an_error() {
    let temp = TempDir::new().unwrap();
    let err = checker().check_tree(temp.path().join("nope")).unwrap_err();
    assert!(matches!(err, GuardrailsError::RootNotFound(_)));
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_fails_run_without_aborting() {
    use std::os::unix::fs::PermissionsExt;

    let temp = create_layered_tree();
    let locked = temp.path().join("composed/Card/Card.tsx");
    std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();
    if std::fs::read(&locked).is_ok() {
        // running as root; permissions are not enforced
        return;
    }

    let run = checker().check_tree(temp.path()).unwrap();
    assert_eq!(run.io_errors.len(), 1);
    assert_eq!(run.files_scanned, 3);
    assert!(!run.passed);
}

#[test]
fn test_report_projections_share_one_result() {
    let temp = TempDir::new().unwrap();
    create_file_at_path(temp.path(), "blocks/A.tsx", "import x from '../shells/X';\n");
    let run = checker().check_tree(temp.path()).unwrap();
    let report = BoundaryReport::from_run(&run);

    let json: serde_json::Value = serde_json::from_str(&Reporter::to_json(&report)).unwrap();
    assert_eq!(json["totalViolations"], 1);
    assert!(Reporter::to_human_readable(&report, 0).contains("Layer Violations (1)"));
    assert!(Reporter::to_ci_summary(&report).contains("line=1,title=GR-LAYER"));
    assert!(Path::new(json["root"].as_str().unwrap()).ends_with(temp.path().file_name().unwrap()));
}
