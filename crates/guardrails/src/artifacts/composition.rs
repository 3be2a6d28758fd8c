//! Composition graph documents.
//!
//! A composition graph is a tree of nodes, each naming the component it
//! renders and carrying optional props, data attributes, slot and role.
//! Every node at every depth is checked with the same rules.

use super::schema::{FieldPath, Findings, object, type_name};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Attribute carrying a node's test id
pub const TEST_ID_ATTRIBUTE: &str = "data-testid";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositionDocument {
    pub component_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub root: CompositionNode,
}

/// One node of the composition tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositionNode {
    /// Component rendered at this node
    pub component_ref: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data_attributes: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<CompositionNode>,
}

impl CompositionNode {
    /// Visit this node and all descendants, depth first, with their paths
    pub fn walk<'a>(&'a self, path: &FieldPath, visit: &mut impl FnMut(&FieldPath, &'a Self)) {
        let mut stack = vec![(path.clone(), self)];
        while let Some((path, node)) = stack.pop() {
            visit(&path, node);
            let children = path.key("children");
            for (i, child) in node.children.iter().enumerate().rev() {
                stack.push((children.index(i), child));
            }
        }
    }

    pub fn test_id(&self) -> Option<&str> {
        self.data_attributes.get(TEST_ID_ATTRIBUTE)?.as_str()
    }

    /// Depth of the tree rooted here; a leaf has depth 1
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 1)];
        while let Some((node, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            stack.extend(node.children.iter().map(|child| (child, depth + 1)));
        }
        deepest
    }
}

impl CompositionDocument {
    /// Every test id used in the tree, with the path of its node
    pub fn test_ids(&self) -> Vec<(FieldPath, &str)> {
        let mut ids = Vec::new();
        self.root.walk(&FieldPath::root().key("root"), &mut |path, node| {
            if let Some(id) = node.test_id() {
                ids.push((path.clone(), id));
            }
        });
        ids
    }
}

/// Validate a composition document against its schema
pub fn validate(doc: &Value, component: &str, findings: &mut Findings) {
    let Some(obj) = object(doc, &FieldPath::root(), findings) else {
        return;
    };
    obj.component_name(component, findings);
    obj.optional_str("version", findings);
    if let Some(root) = obj.required("root", findings) {
        validate_tree(root, obj.path_of("root"), findings);
    }
}

/// Check every node in pre-order with an explicit stack, so document
/// nesting is the only depth limit.
fn validate_tree(root: &Value, path: FieldPath, findings: &mut Findings) {
    let mut pending = vec![(root, path)];
    while let Some((value, path)) = pending.pop() {
        let first_child = pending.len();
        validate_node(value, &path, findings, &mut pending);
        pending[first_child..].reverse();
    }
}

fn validate_node<'a>(
    value: &'a Value,
    path: &FieldPath,
    findings: &mut Findings,
    pending: &mut Vec<(&'a Value, FieldPath)>,
) {
    let Some(node) = object(value, path, findings) else {
        return;
    };

    node.required_str("componentRef", findings);
    node.optional_object("props", findings);
    node.optional_str("slot", findings);
    node.optional_str("role", findings);

    if let Some(attrs) = node.optional_object("dataAttributes", findings) {
        for (key, value) in attrs.map {
            let attr_path = attrs.path_of(key);
            if !key.starts_with("data-") {
                findings.warning(&attr_path, "data attribute names should start with `data-`");
            }
            if value.is_array() || value.is_object() || value.is_null() {
                findings.error(
                    &attr_path,
                    format!("expected scalar value, found {}", type_name(value)),
                );
            }
        }
    }

    if let Some(children) = node.optional_array("children", findings) {
        let children_path = node.path_of("children");
        for (i, child) in children.iter().enumerate() {
            pending.push((child, children_path.index(i)));
        }
    }
}
