//! Approval Workflow Model
//!
//! Data shape of a component's approval record. Status changes are made by
//! reviewers and tooling through the helpers below; validation only checks
//! that a record is internally consistent.

use crate::Severity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Overall record status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Draft,
    InReview,
    Approved,
    Implemented,
    Rejected,
}

impl ApprovalStatus {
    pub const ALL: [&'static str; 5] = ["draft", "in_review", "approved", "implemented", "rejected"];

    /// Whether reviewers may move a record from `self` to `next`
    pub fn can_transition_to(self, next: Self) -> bool {
        use ApprovalStatus::{Approved, Draft, Implemented, InReview, Rejected};
        matches!(
            (self, next),
            (Draft, InReview)
                | (InReview, Approved | Rejected | Draft)
                | (Approved, Implemented | InReview)
                | (Rejected, Draft | InReview)
        )
    }
}

impl std::fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Draft => "draft",
            Self::InReview => "in_review",
            Self::Approved => "approved",
            Self::Implemented => "implemented",
            Self::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

/// Status of a single review phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    Pending,
    InProgress,
    Approved,
    Rejected,
}

impl PhaseStatus {
    pub const ALL: [&'static str; 4] = ["pending", "in_progress", "approved", "rejected"];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockerStatus {
    Open,
    Resolved,
}

impl BlockerStatus {
    pub const ALL: [&'static str; 2] = ["open", "resolved"];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRecord {
    pub component_name: String,
    pub version: String,
    pub status: ApprovalStatus,
    pub workflow: Workflow,
    #[serde(default)]
    pub approvals: Vec<ApprovalEntry>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub blockers: Vec<Blocker>,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    pub current_phase: String,
    pub phases: Vec<ApprovalPhase>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalPhase {
    pub name: String,
    pub status: PhaseStatus,
    #[serde(default)]
    pub required_approvals: Vec<String>,
    #[serde(default)]
    pub approvals: Vec<ApprovalEntry>,
    #[serde(default)]
    pub artifacts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalEntry {
    pub phase: String,
    pub role: String,
    pub approver: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub author: String,
    pub timestamp: DateTime<Utc>,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blocker {
    pub id: String,
    pub description: String,
    pub status: BlockerStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Append-only log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub action: String,
    pub actor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<ApprovalStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<ApprovalStatus>,
}

/// A consistency problem found in a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowFinding {
    pub severity: Severity,
    /// Dotted path of the offending field
    pub path: String,
    pub message: String,
}

impl WorkflowFinding {
    fn error(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            path: path.into(),
            message: message.into(),
        }
    }

    fn warning(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Original array positions of a record's elements. A record rebuilt from
/// a document with malformed elements dropped uses these so findings still
/// name the element as written; empty lists mean positions are unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourcePositions {
    pub phases: Vec<usize>,
    /// Per kept phase, positions of its kept approvals
    pub phase_approvals: Vec<Vec<usize>>,
    pub approvals: Vec<usize>,
    pub blockers: Vec<usize>,
    pub history: Vec<usize>,
    /// Names of phases present in the document but not rebuilt
    pub unreadable_phases: Vec<String>,
}

impl SourcePositions {
    fn phase(&self, i: usize) -> usize {
        original(&self.phases, i)
    }

    fn phase_approval(&self, phase: usize, j: usize) -> usize {
        self.phase_approvals
            .get(phase)
            .map_or(j, |kept| original(kept, j))
    }

    fn approval(&self, i: usize) -> usize {
        original(&self.approvals, i)
    }

    fn blocker(&self, i: usize) -> usize {
        original(&self.blockers, i)
    }

    fn history(&self, i: usize) -> usize {
        original(&self.history, i)
    }
}


fn original(kept: &[usize], i: usize) -> usize {
    kept.get(i).copied().unwrap_or(i)
}

/// Rejected mutation of an approval record
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("illegal status transition {from} -> {to}")]
    IllegalTransition {
        from: ApprovalStatus,
        to: ApprovalStatus,
    },

    #[error("unknown phase `{0}`")]
    UnknownPhase(String),

    #[error("unknown blocker `{0}`")]
    UnknownBlocker(String),

    #[error("blocker `{0}` is already resolved")]
    BlockerAlreadyResolved(String),
}

impl ApprovalRecord {
    pub fn phase(&self, name: &str) -> Option<&ApprovalPhase> {
        self.workflow.phases.iter().find(|p| p.name == name)
    }

    fn phase_known(&self, name: &str, positions: &SourcePositions) -> bool {
        self.phase(name).is_some() || positions.unreadable_phases.iter().any(|p| p == name)
    }

    /// Approvals that count toward `phase`: those embedded in the phase plus
    /// top-level entries naming it
    pub fn approvals_for<'a>(
        &'a self,
        phase: &'a ApprovalPhase,
    ) -> impl Iterator<Item = &'a ApprovalEntry> + 'a {
        phase.approvals.iter().chain(
            self.approvals
                .iter()
                .filter(move |entry| entry.phase == phase.name),
        )
    }

    /// Required roles of `phase` still short of an approval. Each listed
    /// role consumes one entry, so a role required twice needs two.
    pub fn missing_roles<'a>(&'a self, phase: &'a ApprovalPhase) -> Vec<&'a str> {
        let mut available: HashMap<&str, usize> = HashMap::new();
        for entry in self.approvals_for(phase) {
            *available.entry(entry.role.as_str()).or_default() += 1;
        }
        phase
            .required_approvals
            .iter()
            .filter(|role| match available.get_mut(role.as_str()) {
                Some(count) if *count > 0 => {
                    *count -= 1;
                    false
                }
                _ => true,
            })
            .map(String::as_str)
            .collect()
    }

    /// Move the record to `to`, appending a history entry
    pub fn transition(
        &mut self,
        to: ApprovalStatus,
        actor: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Result<(), WorkflowError> {
        let from = self.status;
        if !from.can_transition_to(to) {
            return Err(WorkflowError::IllegalTransition { from, to });
        }
        self.status = to;
        self.history.push(HistoryEntry {
            timestamp: at,
            action: "status_change".to_string(),
            actor: actor.into(),
            from: Some(from),
            to: Some(to),
        });
        Ok(())
    }

    /// Record an approval for an existing phase
    pub fn record_approval(&mut self, entry: ApprovalEntry) -> Result<(), WorkflowError> {
        let phase = self
            .workflow
            .phases
            .iter_mut()
            .find(|p| p.name == entry.phase)
            .ok_or_else(|| WorkflowError::UnknownPhase(entry.phase.clone()))?;
        self.history.push(HistoryEntry {
            timestamp: entry.timestamp,
            action: format!("approved:{}", entry.role),
            actor: entry.approver.clone(),
            from: None,
            to: None,
        });
        phase.approvals.push(entry);
        Ok(())
    }

    pub fn resolve_blocker(&mut self, id: &str, at: DateTime<Utc>) -> Result<(), WorkflowError> {
        let blocker = self
            .blockers
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| WorkflowError::UnknownBlocker(id.to_string()))?;
        if blocker.status == BlockerStatus::Resolved {
            return Err(WorkflowError::BlockerAlreadyResolved(id.to_string()));
        }
        blocker.status = BlockerStatus::Resolved;
        blocker.resolved_at = Some(at);
        Ok(())
    }

    /// Check internal consistency; never mutates the record
    pub fn check_consistency(&self) -> Vec<WorkflowFinding> {
        self.check_consistency_at(&SourcePositions::default())
    }

    /// Same checks, with element paths mapped through `positions`
    pub fn check_consistency_at(&self, positions: &SourcePositions) -> Vec<WorkflowFinding> {
        let mut findings = Vec::new();
        self.check_phases(positions, &mut findings);
        self.check_top_level_approvals(positions, &mut findings);
        self.check_history(positions, &mut findings);
        self.check_blockers(positions, &mut findings);
        self.check_overall_status(&mut findings);
        findings
    }

    fn check_phases(&self, positions: &SourcePositions, findings: &mut Vec<WorkflowFinding>) {
        if !self.phase_known(&self.workflow.current_phase, positions) {
            findings.push(WorkflowFinding::error(
                "workflow.currentPhase",
                format!("current phase `{}` is not a defined phase", self.workflow.current_phase),
            ));
        }

        let mut names = HashSet::new();
        for (i, phase) in self.workflow.phases.iter().enumerate() {
            let path = format!("workflow.phases[{}]", positions.phase(i));
            if !names.insert(phase.name.as_str()) {
                findings.push(WorkflowFinding::error(
                    format!("{path}.name"),
                    format!("duplicate phase `{}`", phase.name),
                ));
            }

            for (j, entry) in phase.approvals.iter().enumerate() {
                if entry.phase != phase.name {
                    findings.push(WorkflowFinding::warning(
                        format!("{path}.approvals[{}].phase", positions.phase_approval(i, j)),
                        format!(
                            "approval recorded under phase `{}` names phase `{}`",
                            phase.name, entry.phase
                        ),
                    ));
                }
            }

            let mut orphan_roles = HashSet::new();
            for entry in self.approvals_for(phase) {
                if !phase.required_approvals.contains(&entry.role)
                    && orphan_roles.insert(entry.role.as_str())
                {
                    findings.push(WorkflowFinding::warning(
                        format!("{path}.approvals"),
                        format!(
                            "approval by role `{}` is not required in phase `{}`",
                            entry.role, phase.name
                        ),
                    ));
                }
            }

            if phase.status == PhaseStatus::Approved {
                for role in self.missing_roles(phase) {
                    findings.push(WorkflowFinding::error(
                        format!("{path}.status"),
                        format!(
                            "phase `{}` is approved but lacks an approval from required role `{role}`",
                            phase.name
                        ),
                    ));
                }
            }
        }
    }

    fn check_top_level_approvals(
        &self,
        positions: &SourcePositions,
        findings: &mut Vec<WorkflowFinding>,
    ) {
        for (i, entry) in self.approvals.iter().enumerate() {
            if !self.phase_known(&entry.phase, positions) {
                findings.push(WorkflowFinding::warning(
                    format!("approvals[{}].phase", positions.approval(i)),
                    format!("approval references unknown phase `{}`", entry.phase),
                ));
            }
        }
    }

    fn check_history(&self, positions: &SourcePositions, findings: &mut Vec<WorkflowFinding>) {
        for (i, pair) in self.history.windows(2).enumerate() {
            if pair[1].timestamp < pair[0].timestamp {
                findings.push(WorkflowFinding::warning(
                    format!("history[{}].timestamp", positions.history(i + 1)),
                    "history timestamp is earlier than the previous entry",
                ));
            }
        }
        for (i, entry) in self.history.iter().enumerate() {
            if let (Some(from), Some(to)) = (entry.from, entry.to) {
                if !from.can_transition_to(to) {
                    findings.push(WorkflowFinding::warning(
                        format!("history[{}]", positions.history(i)),
                        format!("status change {from} -> {to} is not an allowed transition"),
                    ));
                }
            }
        }
    }

    fn check_blockers(&self, positions: &SourcePositions, findings: &mut Vec<WorkflowFinding>) {
        let mut ids = HashSet::new();
        for (i, blocker) in self.blockers.iter().enumerate() {
            let path = format!("blockers[{}]", positions.blocker(i));
            if !ids.insert(blocker.id.as_str()) {
                findings.push(WorkflowFinding::error(
                    format!("{path}.id"),
                    format!("duplicate blocker id `{}`", blocker.id),
                ));
            }
            match (blocker.status, blocker.resolved_at) {
                (BlockerStatus::Resolved, None) => findings.push(WorkflowFinding::error(
                    format!("{path}.resolvedAt"),
                    "resolved blocker has no resolvedAt timestamp",
                )),
                (BlockerStatus::Resolved, Some(resolved)) if resolved < blocker.created_at => {
                    findings.push(WorkflowFinding::error(
                        format!("{path}.resolvedAt"),
                        "resolvedAt is earlier than createdAt",
                    ));
                }
                (BlockerStatus::Open, Some(_)) => findings.push(WorkflowFinding::warning(
                    format!("{path}.resolvedAt"),
                    "open blocker carries a resolvedAt timestamp",
                )),
                _ => {}
            }
        }
    }

    fn check_overall_status(&self, findings: &mut Vec<WorkflowFinding>) {
        if !matches!(
            self.status,
            ApprovalStatus::Approved | ApprovalStatus::Implemented
        ) {
            return;
        }
        let open = self
            .blockers
            .iter()
            .filter(|b| b.status == BlockerStatus::Open)
            .count();
        if open > 0 {
            findings.push(WorkflowFinding::warning(
                "status",
                format!("record is {} with {open} open blocker(s)", self.status),
            ));
        }
        for phase in &self.workflow.phases {
            if phase.status != PhaseStatus::Approved {
                findings.push(WorkflowFinding::warning(
                    "status",
                    format!("record is {} but phase `{}` is not approved", self.status, phase.name),
                ));
            }
        }
    }
}
