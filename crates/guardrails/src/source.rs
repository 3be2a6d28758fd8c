//! Source files and comment stripping.

use crate::scan::relative_to;
use std::ops::Range;
use std::path::{Path, PathBuf};

/// One walked source file; immutable once read
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Path as walked
    pub path: PathBuf,
    /// Path relative to the scan root, used for layer classification
    pub relative: PathBuf,
    /// Raw text
    pub text: String,
    /// Text with comments blanked out, same line structure as `text`
    pub stripped: String,
    /// Byte ranges of `stripped` holding string or template literal contents
    pub literals: Vec<Range<usize>>,
}

impl SourceFile {
    /// Build from in-memory text; `path` doubles as the relative path
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        let path = path.into();
        let text = text.into();
        let StrippedText { text: stripped, literals } = strip_source(&text);
        Self {
            relative: path.clone(),
            path,
            text,
            stripped,
            literals,
        }
    }

    /// Read `path` from disk; `root` anchors the relative path
    pub fn read(root: &Path, path: &Path) -> std::io::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let StrippedText { text: stripped, literals } = strip_source(&text);
        Ok(Self {
            path: path.to_path_buf(),
            relative: relative_to(root, path),
            text,
            stripped,
            literals,
        })
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    Code,
    LineComment,
    BlockComment,
    Quoted(char),
    Template,
}

/// Comment-free text and where its literal contents lie
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrippedText {
    pub text: String,
    /// Contents of string and template literals, quotes excluded, in
    /// ascending order. `${ ... }` substitutions are code and not included.
    pub literals: Vec<Range<usize>>,
}

/// Replace line and block comments with whitespace.
///
/// Line breaks survive, so every line keeps its number. String and template
/// literals are tracked so that `//` or `/*` inside them is left alone.
/// Block comments do not nest: the first `*/` closes. Regex literals are
/// not recognized.
pub fn strip_comments(text: &str) -> String {
    strip_source(text).text
}

/// [`strip_comments`], also recording the literal ranges of the result
pub fn strip_source(text: &str) -> StrippedText {
    let mut out = String::with_capacity(text.len());
    let mut literals = Vec::new();
    let mut chars = text.chars().peekable();
    let mut state = State::Code;
    // Brace depth inside each open `${ ... }` template substitution
    let mut substitutions: Vec<usize> = Vec::new();
    // Start of the literal contents being read
    let mut literal_start = 0;

    while let Some(c) = chars.next() {
        match state {
            State::Code => match c {
                '/' if chars.peek() == Some(&'/') => {
                    chars.next();
                    out.push_str("  ");
                    state = State::LineComment;
                }
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    out.push_str("  ");
                    state = State::BlockComment;
                }
                '\'' | '"' => {
                    out.push(c);
                    literal_start = out.len();
                    state = State::Quoted(c);
                }
                '`' => {
                    out.push(c);
                    literal_start = out.len();
                    state = State::Template;
                }
                '{' => {
                    if let Some(depth) = substitutions.last_mut() {
                        *depth += 1;
                    }
                    out.push(c);
                }
                '}' => {
                    out.push(c);
                    match substitutions.last_mut() {
                        Some(0) => {
                            substitutions.pop();
                            literal_start = out.len();
                            state = State::Template;
                        }
                        Some(depth) => *depth -= 1,
                        None => {}
                    }
                }
                _ => out.push(c),
            },
            State::LineComment => {
                if c == '\n' {
                    state = State::Code;
                }
                out.push(blank(c));
            }
            State::BlockComment => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    out.push_str("  ");
                    state = State::Code;
                } else {
                    out.push(blank(c));
                }
            }
            State::Quoted(quote) => {
                if c == quote || c == '\n' {
                    // An unterminated string ends at the line break
                    literals.push(literal_start..out.len());
                    state = State::Code;
                }
                out.push(c);
                if c == '\\' {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
            }
            State::Template => {
                if c == '$' && chars.peek() == Some(&'{') {
                    literals.push(literal_start..out.len());
                    chars.next();
                    out.push_str("${");
                    substitutions.push(0);
                    state = State::Code;
                    continue;
                }
                if c == '`' {
                    literals.push(literal_start..out.len());
                    state = State::Code;
                }
                out.push(c);
                if c == '\\' {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
            }
        }
    }
    if matches!(state, State::Quoted(_) | State::Template) {
        literals.push(literal_start..out.len());
    }
    literals.retain(|range| !range.is_empty());
    StrippedText {
        text: out,
        literals,
    }
}

fn blank(c: char) -> char {
    match c {
        '\n' | '\r' | '\t' => c,
        _ => ' ',
    }
}
