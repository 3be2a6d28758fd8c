//! Test-id registry documents

use super::schema::{FieldPath, Findings, object};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

static KEBAB_CASE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").expect("Invalid kebab-case regex"));

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestIdRegistry {
    pub component_name: String,
    pub test_ids: Vec<TestIdEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestIdEntry {
    pub id: String,
    /// Element the id is attached to, e.g. `button`
    pub element: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TestIdRegistry {
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.test_ids.iter().map(|entry| entry.id.as_str())
    }
}

pub fn validate(doc: &Value, component: &str, findings: &mut Findings) {
    let Some(obj) = object(doc, &FieldPath::root(), findings) else {
        return;
    };
    obj.component_name(component, findings);

    let Some(entries) = obj.required_array("testIds", findings) else {
        return;
    };
    let list_path = obj.path_of("testIds");
    let mut first_seen: HashMap<&str, usize> = HashMap::new();

    for (i, value) in entries.iter().enumerate() {
        let Some(entry) = object(value, &list_path.index(i), findings) else {
            continue;
        };
        entry.required_str("element", findings);
        entry.optional_str("description", findings);

        let Some(id) = entry.required_str("id", findings) else {
            continue;
        };
        if let Some(first) = first_seen.get(id) {
            findings.error(
                &entry.path_of("id"),
                format!("duplicate test id `{id}` (first defined at testIds[{first}])"),
            );
            continue;
        }
        first_seen.insert(id, i);
        if !KEBAB_CASE.is_match(id) {
            findings.warning(&entry.path_of("id"), format!("test id `{id}` is not kebab-case"));
        }
    }
}
