//! Field-level schema checks over `serde_json::Value`.
//!
//! Every check records its failure and returns `None` instead of stopping,
//! so one pass over a document reports all of its problems.

use super::ArtifactIssue;
use crate::Severity;
use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fmt;
use std::path::PathBuf;

/// Dotted path to a field, with `[i]` for array elements
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath(String);

impl FieldPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn key(&self, key: &str) -> Self {
        if self.0.is_empty() {
            Self(key.to_string())
        } else {
            Self(format!("{}.{key}", self.0))
        }
    }

    pub fn index(&self, index: usize) -> Self {
        Self(format!("{}[{index}]", self.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("<root>")
        } else {
            f.write_str(&self.0)
        }
    }
}

/// Issue sink for one document
#[derive(Debug)]
pub struct Findings {
    file: PathBuf,
    pub issues: Vec<ArtifactIssue>,
}

impl Findings {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            issues: Vec::new(),
        }
    }

    pub fn error(&mut self, path: &FieldPath, message: impl Into<String>) {
        self.push(Severity::Error, path, None, message.into());
    }

    pub fn warning(&mut self, path: &FieldPath, message: impl Into<String>) {
        self.push(Severity::Warning, path, None, message.into());
    }

    /// Issue tied to a line of a text document rather than a field
    pub fn at_line(&mut self, severity: Severity, line: usize, message: impl Into<String>) {
        self.push(severity, &FieldPath::root(), Some(line), message.into());
    }

    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    fn push(&mut self, severity: Severity, path: &FieldPath, line: Option<usize>, message: String) {
        self.issues.push(ArtifactIssue {
            file: self.file.clone(),
            path: (!path.as_str().is_empty()).then(|| path.as_str().to_string()),
            line,
            message,
            severity,
        });
    }
}

/// Parse a JSON document; syntax errors become one issue with line/column.
/// Nesting depth is not limited; deep trees grow the stack on demand.
pub fn parse_json(text: &str, findings: &mut Findings) -> Option<Value> {
    match parse_unbounded(text) {
        Ok(value) => Some(value),
        Err(err) => {
            findings.at_line(
                Severity::Error,
                err.line(),
                format!("invalid JSON at line {} column {}: {err}", err.line(), err.column()),
            );
            None
        }
    }
}

fn parse_unbounded(text: &str) -> serde_json::Result<Value> {
    let mut de = serde_json::Deserializer::from_str(text);
    de.disable_recursion_limit();
    let value = Value::deserialize(serde_stacker::Deserializer::new(&mut de))?;
    de.end()?;
    Ok(value)
}

/// Deserialize a typed model from an arbitrarily deep value
pub fn from_value_deep<T: DeserializeOwned>(value: &Value) -> serde_json::Result<T> {
    T::deserialize(serde_stacker::Deserializer::new(value))
}

pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// View `value` as an object, recording an error otherwise
pub fn object<'a>(
    value: &'a Value,
    path: &FieldPath,
    findings: &mut Findings,
) -> Option<ObjectCheck<'a>> {
    match value {
        Value::Object(map) => Some(ObjectCheck {
            map,
            path: path.clone(),
        }),
        other => {
            findings.error(path, format!("expected object, found {}", type_name(other)));
            None
        }
    }
}

/// Field accessors over one JSON object
pub struct ObjectCheck<'a> {
    pub map: &'a Map<String, Value>,
    pub path: FieldPath,
}

impl<'a> ObjectCheck<'a> {
    pub fn path_of(&self, key: &str) -> FieldPath {
        self.path.key(key)
    }

    /// Present and non-null value of `key`
    fn present(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key).filter(|v| !v.is_null())
    }

    pub fn required(&self, key: &str, findings: &mut Findings) -> Option<&'a Value> {
        let value = self.present(key);
        if value.is_none() {
            findings.error(&self.path_of(key), "missing required field");
        }
        value
    }

    pub fn required_str(&self, key: &str, findings: &mut Findings) -> Option<&'a str> {
        let value = self.required(key, findings)?;
        self.expect_str(key, value, findings)
    }

    pub fn optional_str(&self, key: &str, findings: &mut Findings) -> Option<&'a str> {
        let value = self.present(key)?;
        self.expect_str(key, value, findings)
    }

    fn expect_str(&self, key: &str, value: &'a Value, findings: &mut Findings) -> Option<&'a str> {
        match value {
            Value::String(s) if s.trim().is_empty() => {
                findings.error(&self.path_of(key), "must not be empty");
                None
            }
            Value::String(s) => Some(s.as_str()),
            other => {
                findings.error(
                    &self.path_of(key),
                    format!("expected string, found {}", type_name(other)),
                );
                None
            }
        }
    }

    pub fn required_array(&self, key: &str, findings: &mut Findings) -> Option<&'a [Value]> {
        let value = self.required(key, findings)?;
        self.expect_array(key, value, findings)
    }

    pub fn optional_array(&self, key: &str, findings: &mut Findings) -> Option<&'a [Value]> {
        let value = self.present(key)?;
        self.expect_array(key, value, findings)
    }

    fn expect_array(
        &self,
        key: &str,
        value: &'a Value,
        findings: &mut Findings,
    ) -> Option<&'a [Value]> {
        if let Value::Array(items) = value {
            Some(items.as_slice())
        } else {
            findings.error(
                &self.path_of(key),
                format!("expected array, found {}", type_name(value)),
            );
            None
        }
    }

    /// Array whose every element must be a non-empty string
    pub fn required_string_array(&self, key: &str, findings: &mut Findings) -> Vec<&'a str> {
        let path = self.path_of(key);
        let Some(items) = self.required_array(key, findings) else {
            return Vec::new();
        };
        items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| match item {
                Value::String(s) if !s.trim().is_empty() => Some(s.as_str()),
                other => {
                    findings.error(
                        &path.index(i),
                        format!("expected non-empty string, found {}", type_name(other)),
                    );
                    None
                }
            })
            .collect()
    }

    pub fn required_object(&self, key: &str, findings: &mut Findings) -> Option<ObjectCheck<'a>> {
        let value = self.required(key, findings)?;
        object(value, &self.path_of(key), findings)
    }

    pub fn optional_object(&self, key: &str, findings: &mut Findings) -> Option<ObjectCheck<'a>> {
        let value = self.present(key)?;
        object(value, &self.path_of(key), findings)
    }

    /// String drawn from a fixed set of values
    pub fn required_enum(
        &self,
        key: &str,
        allowed: &[&str],
        findings: &mut Findings,
    ) -> Option<&'a str> {
        let value = self.required_str(key, findings)?;
        self.expect_member(key, value, allowed, findings)
    }

    pub fn optional_enum(
        &self,
        key: &str,
        allowed: &[&str],
        findings: &mut Findings,
    ) -> Option<&'a str> {
        let value = self.optional_str(key, findings)?;
        self.expect_member(key, value, allowed, findings)
    }

    fn expect_member(
        &self,
        key: &str,
        value: &'a str,
        allowed: &[&str],
        findings: &mut Findings,
    ) -> Option<&'a str> {
        if allowed.contains(&value) {
            Some(value)
        } else {
            findings.error(
                &self.path_of(key),
                format!("`{value}` is not one of: {}", allowed.join(", ")),
            );
            None
        }
    }

    /// RFC 3339 timestamp
    pub fn required_timestamp(
        &self,
        key: &str,
        findings: &mut Findings,
    ) -> Option<DateTime<FixedOffset>> {
        let value = self.required_str(key, findings)?;
        self.expect_timestamp(key, value, findings)
    }

    pub fn optional_timestamp(
        &self,
        key: &str,
        findings: &mut Findings,
    ) -> Option<DateTime<FixedOffset>> {
        let value = self.optional_str(key, findings)?;
        self.expect_timestamp(key, value, findings)
    }

    fn expect_timestamp(
        &self,
        key: &str,
        value: &str,
        findings: &mut Findings,
    ) -> Option<DateTime<FixedOffset>> {
        match DateTime::parse_from_rfc3339(value) {
            Ok(ts) => Some(ts),
            Err(err) => {
                findings.error(
                    &self.path_of(key),
                    format!("`{value}` is not an RFC 3339 timestamp: {err}"),
                );
                None
            }
        }
    }

    /// Warn when a document's `componentName` disagrees with its directory
    pub fn component_name(&self, expected: &str, findings: &mut Findings) {
        if let Some(name) = self.required_str("componentName", findings) {
            if name != expected {
                findings.warning(
                    &self.path_of("componentName"),
                    format!("`{name}` does not match component directory `{expected}`"),
                );
            }
        }
    }
}
