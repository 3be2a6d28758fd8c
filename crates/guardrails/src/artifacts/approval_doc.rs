//! Approval record documents
//!
//! Two passes: a structural walk over the raw JSON that reports every
//! shape problem with its path, then the consistency checks of the typed
//! [`ApprovalRecord`]. A record with shape problems is rebuilt from its
//! well-formed elements so both passes always run.

use super::schema::{FieldPath, Findings, ObjectCheck, object};
use crate::Severity;
use crate::approval::{
    ApprovalPhase, ApprovalRecord, ApprovalStatus, BlockerStatus, PhaseStatus, SourcePositions,
    Workflow,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub fn validate(doc: Value, component: &str, findings: &mut Findings) {
    check_structure(&doc, component, findings);

    let (record, positions) = if findings.has_errors() {
        salvage(&doc)
    } else {
        match serde_json::from_value::<ApprovalRecord>(doc) {
            Ok(record) => (record, SourcePositions::default()),
            Err(err) => {
                findings.error(
                    &FieldPath::root(),
                    format!("approval record could not be read: {err}"),
                );
                return;
            }
        }
    };

    // Fields reported as malformed, or inside one, get no second finding.
    let flagged: Vec<String> = findings
        .issues
        .iter()
        .filter(|issue| issue.severity == Severity::Error)
        .filter_map(|issue| issue.path.clone())
        .collect();

    for finding in record.check_consistency_at(&positions) {
        if flagged.iter().any(|field| within(&finding.path, field)) {
            continue;
        }
        let path = FieldPath::root().key(&finding.path);
        match finding.severity {
            Severity::Error => findings.error(&path, finding.message),
            Severity::Warning | Severity::Info => findings.warning(&path, finding.message),
        }
    }
}

/// Whether `path` is `field` or one of its descendants
fn within(path: &str, field: &str) -> bool {
    path.strip_prefix(field)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(['.', '[']))
}

/// Rebuild a record from the elements that deserialize on their own.
/// An unreadable status counts as `draft`, which has no status checks.
fn salvage(doc: &Value) -> (ApprovalRecord, SourcePositions) {
    let mut positions = SourcePositions::default();
    let text = |value: Option<&Value>| value.and_then(Value::as_str).unwrap_or_default().to_string();
    let workflow = doc.get("workflow");

    let mut phases = Vec::new();
    if let Some(Value::Array(items)) = workflow.and_then(|w| w.get("phases")) {
        for (i, item) in items.iter().enumerate() {
            let mut fields = item.as_object().cloned().unwrap_or_default();
            let approvals = fields.remove("approvals");
            match serde_json::from_value::<ApprovalPhase>(Value::Object(fields)) {
                Ok(mut phase) => {
                    let mut kept = Vec::new();
                    phase.approvals = salvage_items(approvals.as_ref(), &mut kept);
                    positions.phases.push(i);
                    positions.phase_approvals.push(kept);
                    phases.push(phase);
                }
                Err(_) => {
                    if let Some(name) = item.get("name").and_then(Value::as_str) {
                        positions.unreadable_phases.push(name.to_string());
                    }
                }
            }
        }
    }

    let record = ApprovalRecord {
        component_name: text(doc.get("componentName")),
        version: text(doc.get("version")),
        status: doc
            .get("status")
            .and_then(|status| ApprovalStatus::deserialize(status).ok())
            .unwrap_or(ApprovalStatus::Draft),
        workflow: Workflow {
            current_phase: text(workflow.and_then(|w| w.get("currentPhase"))),
            phases,
        },
        approvals: salvage_items(doc.get("approvals"), &mut positions.approvals),
        comments: salvage_items(doc.get("comments"), &mut Vec::new()),
        blockers: salvage_items(doc.get("blockers"), &mut positions.blockers),
        history: salvage_items(doc.get("history"), &mut positions.history),
    };
    (record, positions)
}

/// Elements of `items` that deserialize as `T`, recording their positions
fn salvage_items<T: DeserializeOwned>(items: Option<&Value>, kept: &mut Vec<usize>) -> Vec<T> {
    let Some(Value::Array(items)) = items else {
        return Vec::new();
    };
    items
        .iter()
        .enumerate()
        .filter_map(|(i, item)| {
            let parsed = T::deserialize(item).ok()?;
            kept.push(i);
            Some(parsed)
        })
        .collect()
}

fn check_structure(doc: &Value, component: &str, findings: &mut Findings) {
    let Some(root) = object(doc, &FieldPath::root(), findings) else {
        return;
    };
    root.component_name(component, findings);
    root.required_str("version", findings);
    root.required_enum("status", &ApprovalStatus::ALL, findings);

    if let Some(workflow) = root.required_object("workflow", findings) {
        workflow.required_str("currentPhase", findings);
        each_object(&workflow, "phases", findings, check_phase);
    }

    each_object(&root, "approvals", findings, check_approval_entry);
    each_object(&root, "comments", findings, |comment, findings| {
        comment.required_str("author", findings);
        comment.required_timestamp("timestamp", findings);
        comment.required_str("text", findings);
        comment.optional_str("phase", findings);
    });
    each_object(&root, "blockers", findings, |blocker, findings| {
        blocker.required_str("id", findings);
        blocker.required_str("description", findings);
        blocker.required_enum("status", &BlockerStatus::ALL, findings);
        blocker.required_timestamp("createdAt", findings);
        blocker.optional_timestamp("resolvedAt", findings);
    });
    each_object(&root, "history", findings, |entry, findings| {
        entry.required_timestamp("timestamp", findings);
        entry.required_str("action", findings);
        entry.required_str("actor", findings);
        entry.optional_enum("from", &ApprovalStatus::ALL, findings);
        entry.optional_enum("to", &ApprovalStatus::ALL, findings);
    });
}

fn check_phase(phase: &ObjectCheck<'_>, findings: &mut Findings) {
    phase.required_str("name", findings);
    phase.required_enum("status", &PhaseStatus::ALL, findings);
    phase.required_string_array("requiredApprovals", findings);
    each_object(phase, "approvals", findings, check_approval_entry);
    phase.required_string_array("artifacts", findings);
}

fn check_approval_entry(entry: &ObjectCheck<'_>, findings: &mut Findings) {
    entry.required_str("phase", findings);
    entry.required_str("role", findings);
    entry.required_str("approver", findings);
    entry.required_timestamp("timestamp", findings);
    entry.optional_str("comment", findings);
}

/// Run `check` on every element of the required array `key`
fn each_object(
    parent: &ObjectCheck<'_>,
    key: &str,
    findings: &mut Findings,
    check: impl Fn(&ObjectCheck<'_>, &mut Findings),
) {
    let Some(items) = parent.required_array(key, findings) else {
        return;
    };
    let path = parent.path_of(key);
    for (i, item) in items.iter().enumerate() {
        if let Some(obj) = object(item, &path.index(i), findings) {
            check(&obj, findings);
        }
    }
}
