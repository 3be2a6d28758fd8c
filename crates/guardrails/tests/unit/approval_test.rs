//! Tests for the approval workflow model

use crate::test_utils::approval_record;
use chrono::{DateTime, Utc};
use guardrails::{
    ApprovalEntry, ApprovalRecord, ApprovalStatus, BlockerStatus, PhaseStatus, Severity,
    WorkflowError,
};

fn record() -> ApprovalRecord {
    serde_json::from_value(approval_record("Card")).unwrap()
}

fn ts(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

fn errors(record: &ApprovalRecord) -> Vec<String> {
    record
        .check_consistency()
        .into_iter()
        .filter(|f| f.severity == Severity::Error)
        .map(|f| f.path)
        .collect()
}

#[test]
fn test_fixture_is_consistent() {
    let record = record();
    assert!(record.check_consistency().is_empty());
    assert_eq!(record.status, ApprovalStatus::InReview);
    assert_eq!(record.workflow.phases[1].status, PhaseStatus::InProgress);
    assert_eq!(record.blockers[0].status, BlockerStatus::Open);
}

#[test]
fn test_approved_phase_without_required_role_fails() {
    let mut record = record();
    record.workflow.phases[1].status = PhaseStatus::Approved;
    record.workflow.phases[1].approvals.push(ApprovalEntry {
        phase: "review".to_string(),
        role: "engineer".to_string(),
        approver: "eli".to_string(),
        timestamp: ts("2024-05-03T10:00:00Z"),
        comment: None,
    });

    let findings = record.check_consistency();
    let errors: Vec<_> = findings
        .iter()
        .filter(|f| f.severity == Severity::Error)
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].path, "workflow.phases[1].status");
    assert!(errors[0].message.contains("a11y"));
}

#[test]
fn test_top_level_approvals_count_toward_phase() {
    let mut record = record();
    record.workflow.phases[1].status = PhaseStatus::Approved;
    for role in ["engineer", "a11y"] {
        record.approvals.push(ApprovalEntry {
            phase: "review".to_string(),
            role: role.to_string(),
            approver: "eli".to_string(),
            timestamp: ts("2024-05-03T10:00:00Z"),
            comment: Some("lgtm".to_string()),
        });
    }
    assert!(errors(&record).is_empty());
    assert!(record.missing_roles(&record.workflow.phases[1]).is_empty());
}

#[test]
fn test_orphan_role_and_clock_skew_are_warnings() {
    let mut record = record();
    record.workflow.phases[0].approvals.push(ApprovalEntry {
        phase: "design".to_string(),
        role: "brand".to_string(),
        approver: "bo".to_string(),
        timestamp: ts("2024-05-01T11:00:00Z"),
        comment: None,
    });
    record.history[1].timestamp = ts("2024-04-30T00:00:00Z");

    let findings = record.check_consistency();
    assert_eq!(findings.len(), 2);
    assert!(findings.iter().all(|f| f.severity == Severity::Warning));
}

#[test]
fn test_blocker_resolution_rules() {
    let mut record = record();
    record.blockers[0].status = BlockerStatus::Resolved;
    assert_eq!(errors(&record), vec!["blockers[0].resolvedAt"]);

    record.blockers[0].resolved_at = Some(ts("2024-05-01T00:00:00Z"));
    assert_eq!(errors(&record), vec!["blockers[0].resolvedAt"]);

    record.blockers[0].resolved_at = Some(ts("2024-05-02T09:05:00Z"));
    assert!(errors(&record).is_empty());
}

#[test]
fn test_transitions_append_history() {
    let mut record = record();
    let before = record.history.len();

    record
        .transition(ApprovalStatus::Approved, "lead", ts("2024-05-04T00:00:00Z"))
        .unwrap();
    assert_eq!(record.status, ApprovalStatus::Approved);
    assert_eq!(record.history.len(), before + 1);
    assert_eq!(record.history[before].from, Some(ApprovalStatus::InReview));

    let err = record
        .transition(ApprovalStatus::Draft, "lead", ts("2024-05-05T00:00:00Z"))
        .unwrap_err();
    assert_eq!(
        err,
        WorkflowError::IllegalTransition {
            from: ApprovalStatus::Approved,
            to: ApprovalStatus::Draft
        }
    );

    record
        .transition(ApprovalStatus::Implemented, "lead", ts("2024-05-06T00:00:00Z"))
        .unwrap();
    for next in [
        ApprovalStatus::Draft,
        ApprovalStatus::InReview,
        ApprovalStatus::Approved,
        ApprovalStatus::Rejected,
    ] {
        assert!(!ApprovalStatus::Implemented.can_transition_to(next));
    }
}

#[test]
fn test_approved_record_with_open_work_warns() {
    let mut record = record();
    record
        .transition(ApprovalStatus::Approved, "lead", ts("2024-05-04T00:00:00Z"))
        .unwrap();

    let findings = record.check_consistency();
    assert!(findings.iter().all(|f| f.severity == Severity::Warning));
    // one open blocker and one phase still in progress
    assert_eq!(findings.iter().filter(|f| f.path == "status").count(), 2);
}

#[test]
fn test_record_approval_and_resolve_blocker() {
    let mut record = record();
    let unknown = ApprovalEntry {
        phase: "launch".to_string(),
        role: "pm".to_string(),
        approver: "pat".to_string(),
        timestamp: ts("2024-05-03T00:00:00Z"),
        comment: None,
    };
    assert_eq!(
        record.record_approval(unknown),
        Err(WorkflowError::UnknownPhase("launch".to_string()))
    );

    let a11y = ApprovalEntry {
        phase: "review".to_string(),
        role: "a11y".to_string(),
        approver: "ali".to_string(),
        timestamp: ts("2024-05-03T00:00:00Z"),
        comment: None,
    };
    record.record_approval(a11y).unwrap();
    assert_eq!(
        record.missing_roles(&record.workflow.phases[1]),
        vec!["engineer"]
    );

    record
        .resolve_blocker("contrast", ts("2024-05-03T01:00:00Z"))
        .unwrap();
    assert_eq!(
        record.resolve_blocker("contrast", ts("2024-05-03T02:00:00Z")),
        Err(WorkflowError::BlockerAlreadyResolved("contrast".to_string()))
    );
    assert!(record.check_consistency().is_empty());
}
