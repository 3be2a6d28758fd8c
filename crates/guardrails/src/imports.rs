//! Import extraction
//!
//! Scans comment-stripped text for module references and yields the literal
//! module path of each statement. Paths are never resolved.

use crate::source::SourceFile;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::ops::Range;
use std::path::{Path, PathBuf};

/// `import`/`export ... from` statements (multi-line lists included) and
/// side-effect imports, or `require(...)` / dynamic `import(...)` calls.
static IMPORT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r#"\b(?:import|export)\s+(?:type\s+)?"#,
        r#"(?:(?:[\w$]+\s*,\s*)?(?:\{[^}]*\}|\*(?:\s*as\s+[\w$]+)?|[\w$]+)\s*from\s*)?"#,
        r#"["'](?P<static>[^"'\n]+)["']"#,
        r#"|\b(?:require|import)\s*\(\s*["'](?P<call>[^"'\n]+)["']\s*\)"#,
    ))
    .expect("Invalid import regex")
});

/// One module reference found in a source file
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReference {
    pub source_file: PathBuf,
    /// Literal module path, unresolved
    pub module_path: String,
    /// 1-based line of the statement keyword
    pub line: usize,
}

/// Extract every module reference from a source file's stripped text
pub fn extract_imports(file: &SourceFile) -> Vec<ImportReference> {
    extract_from_text(&file.path, &file.stripped, &file.literals)
}

/// Extract module references from already-stripped text. A statement whose
/// keyword sits inside one of `literals` is quoted text, not code.
pub fn extract_from_text(
    source_file: &Path,
    stripped: &str,
    literals: &[Range<usize>],
) -> Vec<ImportReference> {
    let lines = LineIndex::new(stripped);
    let mut references = Vec::new();
    let mut from = 0;
    while let Some(caps) = IMPORT_PATTERN.captures_at(stripped, from) {
        let Some(whole) = caps.get(0) else {
            break;
        };
        if inside(literals, whole.start()) {
            // Resume past the keyword so code after the literal is still seen
            from = whole.start() + 1;
            continue;
        }
        from = whole.end();
        if let Some(module) = caps.name("static").or_else(|| caps.name("call")) {
            references.push(ImportReference {
                source_file: source_file.to_path_buf(),
                module_path: module.as_str().trim().to_string(),
                line: lines.line_of(whole.start()),
            });
        }
    }
    references
}

fn inside(literals: &[Range<usize>], offset: usize) -> bool {
    let next = literals.partition_point(|range| range.end <= offset);
    literals.get(next).is_some_and(|range| range.start <= offset)
}

/// Byte offset to line number lookup
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(text: &str) -> Self {
        let starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { starts }
    }

    fn line_of(&self, offset: usize) -> usize {
        match self.starts.binary_search(&offset) {
            Ok(line) => line + 1,
            Err(next) => next,
        }
    }
}
