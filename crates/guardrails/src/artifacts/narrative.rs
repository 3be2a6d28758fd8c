//! Narrative (markdown) documents
//!
//! Headings come from a real markdown parse so that `#` inside code blocks
//! does not count. Placeholder markers are searched line by line outside
//! fenced code.

use super::schema::{FieldPath, Findings};
use crate::Severity;
use once_cell::sync::Lazy;
use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use regex::Regex;
use std::collections::HashSet;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"\{\{[^}\n]*\}\}",
        r"|\[(?:TODO|TBD|PLACEHOLDER)[^\]\n]*\]",
        r"|<!--\s*(?:TODO|TBD)[^\n]*?-->",
        r"|\bTBD\b",
        r"|(?i:lorem ipsum)",
    ))
    .expect("Invalid placeholder regex")
});

static NUMBERING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\d+(?:\.\d+)*[.)]?\s+").expect("Invalid numbering regex"));

/// Check required sections and placeholders
pub fn validate(text: &str, required_sections: &[String], findings: &mut Findings) {
    if text.trim().is_empty() {
        findings.warning(&FieldPath::root(), "document is empty");
        return;
    }

    let found: HashSet<String> = headings(text).iter().map(|h| normalize(h)).collect();
    for section in required_sections {
        if !found.contains(&normalize(section)) {
            findings.warning(
                &FieldPath::root(),
                format!("missing required section `{section}`"),
            );
        }
    }

    for (line_no, marker) in placeholders(text) {
        findings.at_line(
            Severity::Warning,
            line_no,
            format!("unresolved placeholder `{marker}`"),
        );
    }
}

/// Text of every heading, in document order
pub fn headings(text: &str) -> Vec<String> {
    let mut headings = Vec::new();
    let mut current: Option<String> = None;
    for event in Parser::new(text) {
        match event {
            Event::Start(Tag::Heading { .. }) => current = Some(String::new()),
            Event::End(TagEnd::Heading(_)) => headings.extend(current.take()),
            Event::Text(t) | Event::Code(t) => {
                if let Some(heading) = current.as_mut() {
                    heading.push_str(&t);
                }
            }
            _ => {}
        }
    }
    headings
}

/// Placeholder markers with their 1-based line numbers
pub fn placeholders(text: &str) -> Vec<(usize, &str)> {
    let mut markers = Vec::new();
    let mut fence: Option<&str> = None;
    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim_start();
        let opener = ["```", "~~~"].into_iter().find(|f| trimmed.starts_with(f));
        match (fence, opener) {
            (None, Some(f)) => {
                fence = Some(f);
                continue;
            }
            (Some(open), Some(f)) if open == f => {
                fence = None;
                continue;
            }
            (Some(_), _) => continue,
            (None, None) => {}
        }
        markers.extend(PLACEHOLDER.find_iter(line).map(|m| (idx + 1, m.as_str())));
    }
    markers
}

/// "2. Test IDs:" and "test ids" compare equal
fn normalize(heading: &str) -> String {
    NUMBERING
        .replace(heading, "")
        .trim_end_matches(':')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
