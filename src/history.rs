//! Audit history for tasks.
//!
//! Entries are built here and only ever appended; nothing in the crate edits
//! or reorders an existing entry.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::fields::AuditAction;
use crate::task::{AuditDraft, AuditEntry, FieldChange, Task};

/// Field-by-field differences between two versions of a task.
///
/// Keys use the stored (camelCase) field names. `updatedAt` and `history`
/// are bookkeeping and never reported.
pub fn diff(before: &Task, after: &Task) -> BTreeMap<String, FieldChange> {
    let pairs: [(&str, Value, Value); 10] = [
        ("subject", json!(before.subject), json!(after.subject)),
        ("detail", json!(before.detail), json!(after.detail)),
        ("status", json!(before.status), json!(after.status)),
        ("priority", json!(before.priority), json!(after.priority)),
        ("progress", json!(before.progress), json!(after.progress)),
        ("projectId", json!(before.project_id), json!(after.project_id)),
        (
            "assignedEmployees",
            json!(before.assigned_employees),
            json!(after.assigned_employees),
        ),
        ("completedAt", json!(before.completed_at), json!(after.completed_at)),
        (
            "expectedStartAt",
            json!(before.expected_start_at),
            json!(after.expected_start_at),
        ),
        (
            "expectedEndAt",
            json!(before.expected_end_at),
            json!(after.expected_end_at),
        ),
    ];

    pairs
        .into_iter()
        .filter(|(_, from, to)| from != to)
        .map(|(name, from, to)| (name.to_string(), FieldChange { from, to }))
        .collect()
}

/// Turn a caller's draft into a complete entry.
pub fn record(
    draft: AuditDraft,
    before: &Task,
    after: &Task,
    now: DateTime<Utc>,
    default_by: &str,
) -> AuditEntry {
    let changes = match draft.changes {
        Some(explicit) => Some(explicit),
        None => {
            let computed = diff(before, after);
            (!computed.is_empty()).then_some(computed)
        }
    };
    AuditEntry {
        at: draft.at.unwrap_or(now),
        by: draft.by.unwrap_or_else(|| default_by.to_string()),
        action: draft.action,
        summary: draft.summary,
        changes,
    }
}

/// The seed entry every new task starts with.
pub fn created(by: &str, at: DateTime<Utc>) -> AuditEntry {
    AuditEntry {
        at,
        by: by.to_string(),
        action: AuditAction::Created,
        summary: "Created task.".to_string(),
        changes: None,
    }
}

pub fn append(history: &mut Vec<AuditEntry>, entry: AuditEntry) {
    history.push(entry);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{Priority, Status};
    use chrono::TimeZone;

    fn sample() -> Task {
        let at = Utc.with_ymd_and_hms(2025, 11, 20, 9, 0, 0).unwrap();
        Task {
            id: "TASK-001".into(),
            subject: "Payroll review".into(),
            detail: String::new(),
            status: Status::Open,
            priority: Priority::Medium,
            progress: 10,
            assigned_employees: vec!["HR-EMP-00002".into()],
            project_id: "PRJ-001".into(),
            created_by: "HR-EMP-00001".into(),
            created_at: at,
            updated_at: at,
            completed_at: None,
            expected_start_at: None,
            expected_end_at: None,
            history: vec![created("HR-EMP-00001", at)],
        }
    }

    #[test]
    fn diff_reports_only_changed_fields() {
        let before = sample();
        let mut after = before.clone();
        after.status = Status::Working;
        after.progress = 40;
        after.updated_at = after.updated_at + chrono::Duration::minutes(5);

        let changes = diff(&before, &after);
        assert_eq!(changes.len(), 2);
        assert_eq!(changes["status"].from, json!("open"));
        assert_eq!(changes["status"].to, json!("working"));
        assert_eq!(changes["progress"].to, json!(40));
        assert!(!changes.contains_key("updatedAt"));
    }

    #[test]
    fn record_keeps_explicit_changes_and_fills_defaults() {
        let before = sample();
        let after = before.clone();
        let now = Utc.with_ymd_and_hms(2025, 11, 21, 8, 0, 0).unwrap();

        let entry = record(
            AuditDraft::new(AuditAction::Edited, "Edited task fields."),
            &before,
            &after,
            now,
            "HR-EMP-00003",
        );
        assert_eq!(entry.at, now);
        assert_eq!(entry.by, "HR-EMP-00003");
        assert!(entry.changes.is_none());

        let mut explicit = BTreeMap::new();
        explicit.insert(
            "status".to_string(),
            FieldChange { from: json!("open"), to: json!("review") },
        );
        let mut draft = AuditDraft::new(AuditAction::StatusChanged, "Moved to review.").by("E9");
        draft.changes = Some(explicit.clone());
        let entry = record(draft, &before, &after, now, "ignored");
        assert_eq!(entry.by, "E9");
        assert_eq!(entry.changes, Some(explicit));
    }
}
