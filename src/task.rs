//! Task records and the payloads used to create and change them.
//!
//! `Task` serializes with camelCase keys so a persisted snapshot is the same
//! JSON array the portal has always stored.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fields::*;

/// A unit of assignable work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub subject: String,
    #[serde(default)]
    pub detail: String,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub assigned_employees: Vec<String>,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expected_start_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expected_end_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub history: Vec<AuditEntry>,
}

impl Task {
    pub fn is_assigned_to(&self, employee_id: &str) -> bool {
        self.assigned_employees.iter().any(|e| e == employee_id)
    }

    /// Employee id of whoever last touched the task, taken from history.
    pub fn updated_by(&self) -> Option<&str> {
        self.history.last().map(|h| h.by.as_str())
    }
}

/// One immutable record of a change made to a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub at: DateTime<Utc>,
    pub by: String,
    pub action: AuditAction,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changes: Option<BTreeMap<String, FieldChange>>,
}

/// Before/after values of one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub from: serde_json::Value,
    pub to: serde_json::Value,
}

/// Payload for creating a task.
#[derive(Debug, Clone, Default)]
pub struct TaskInput {
    /// Explicit id. When absent the store allocates the next `TASK-NNN`.
    pub id: Option<String>,
    pub subject: String,
    pub detail: String,
    pub status: Status,
    pub priority: Priority,
    pub progress: u8,
    pub project_id: String,
    pub assigned_employees: Vec<String>,
    pub expected_start_at: Option<DateTime<Utc>>,
    pub expected_end_at: Option<DateTime<Utc>>,
}

/// Field changes to merge into an existing task. `None` leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub subject: Option<String>,
    pub detail: Option<String>,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub progress: Option<u8>,
    pub project_id: Option<String>,
    pub assigned_employees: Option<Vec<String>>,
    pub completed_at: Option<Option<DateTime<Utc>>>,
    pub expected_start_at: Option<Option<DateTime<Utc>>>,
    pub expected_end_at: Option<Option<DateTime<Utc>>>,
    /// Overrides the refreshed `updatedAt` stamp.
    pub updated_at: Option<DateTime<Utc>>,
}

impl TaskPatch {
    pub fn status(status: Status) -> Self {
        TaskPatch {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn progress(progress: u8) -> Self {
        TaskPatch {
            progress: Some(progress),
            ..Default::default()
        }
    }
}

/// An audit entry as supplied by a caller; the store fills in the gaps.
#[derive(Debug, Clone)]
pub struct AuditDraft {
    pub action: AuditAction,
    pub summary: String,
    pub at: Option<DateTime<Utc>>,
    pub by: Option<String>,
    /// Explicit changes. When absent the recorder diffs before/after.
    pub changes: Option<BTreeMap<String, FieldChange>>,
}

impl AuditDraft {
    pub fn new(action: AuditAction, summary: impl Into<String>) -> Self {
        AuditDraft {
            action,
            summary: summary.into(),
            at: None,
            by: None,
            changes: None,
        }
    }

    pub fn by(mut self, by: impl Into<String>) -> Self {
        self.by = Some(by.into());
        self
    }
}
