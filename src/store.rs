//! The authoritative in-memory task collection.
//!
//! `TaskStore` owns every task record and is the only place tasks are
//! mutated. After each create or patch it re-applies the completion rules:
//!
//! - `status == completed` if and only if `progress == 100`;
//! - `completedAt` is set if and only if the task is completed, and a first
//!   completion stamp sticks until the status is reverted;
//! - `updatedAt` is refreshed on every patch unless the caller overrides it.
//!
//! Operations on unknown ids are silent no-ops. Authorization is not checked
//! here; see [`crate::portal`] for the guarded entry points.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;

use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use tracing::{debug, warn};

use crate::fields::*;
use crate::history;
use crate::task::{AuditDraft, FieldChange, Task, TaskInput, TaskPatch};

/// Actor recorded when no employee is acting.
pub const SYSTEM_ACTOR: &str = "System";

/// Source of "now" for timestamps.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock(Rc<Cell<DateTime<Utc>>>);

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        ManualClock(Rc::new(Cell::new(start)))
    }

    pub fn set(&self, at: DateTime<Utc>) {
        self.0.set(at);
    }

    pub fn advance(&self, by: Duration) {
        self.0.set(self.0.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.0.get()
    }
}

/// Number of the first `TASK-<digits>` occurrence in an id
/// (case-insensitive). `None` when there is none or it does not fit a `u64`.
pub fn task_seq(id: &str) -> Option<u64> {
    let lower = id.to_ascii_lowercase();
    let digits = lower
        .match_indices("task-")
        .map(|(i, m)| {
            lower[i + m.len()..]
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect::<String>()
        })
        .find(|d| !d.is_empty())?;
    digits.parse().ok()
}

/// Format a sequence number as a task id.
pub fn format_task_id(seq: u64) -> String {
    format!("TASK-{seq:03}")
}

/// In-memory store of tasks with invariant enforcement.
pub struct TaskStore {
    tasks: Vec<Task>,
    high_water: u64,
    actor: Option<String>,
    clock: Box<dyn Clock>,
}

impl Default for TaskStore {
    fn default() -> Self {
        TaskStore::new()
    }
}

impl TaskStore {
    pub fn new() -> Self {
        TaskStore {
            tasks: Vec::new(),
            high_water: 0,
            actor: None,
            clock: Box::new(SystemClock),
        }
    }

    /// Rebuild a store from a persisted snapshot. Stored tasks are brought
    /// back in line with the completion rules; a completion stamp missing
    /// from a task that has to be completed falls back to its `updatedAt`.
    pub fn from_snapshot(mut tasks: Vec<Task>, high_water: u64) -> Self {
        for task in &mut tasks {
            let at = task.updated_at;
            apply_completion_rules(task, false, false, at);
        }
        TaskStore {
            tasks,
            high_water,
            ..TaskStore::new()
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Set the employee id stamped on new tasks and audit entries.
    pub fn set_actor(&mut self, actor: Option<String>) {
        self.actor = actor;
    }

    pub fn actor(&self) -> &str {
        self.actor.as_deref().unwrap_or(SYSTEM_ACTOR)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Highest sequence number ever allocated or seen.
    pub fn high_water(&self) -> u64 {
        let seen = self.tasks.iter().filter_map(|t| task_seq(&t.id)).max().unwrap_or(0);
        self.high_water.max(seen)
    }

    /// The id the next default-id task will receive, or `None` once the
    /// sequence is exhausted.
    pub fn next_id(&self) -> Option<String> {
        self.high_water().checked_add(1).map(format_task_id)
    }

    /// Insert a new task. Returns `None` (and changes nothing) when an
    /// explicit id is already taken or no default id is left.
    pub fn create(&mut self, input: TaskInput) -> Option<&Task> {
        let id = match input.id {
            Some(id) if self.get(&id).is_some() => {
                warn!(task_id = %id, "create with duplicate id ignored");
                return None;
            }
            Some(id) => id,
            None => match self.next_id() {
                Some(id) => id,
                None => {
                    warn!("task id sequence exhausted");
                    return None;
                }
            },
        };
        self.high_water = self.high_water().max(task_seq(&id).unwrap_or(0));

        let now = self.clock.now();
        let by = self.actor().to_string();
        let mut task = Task {
            id,
            subject: input.subject,
            detail: input.detail,
            status: input.status,
            priority: input.priority,
            progress: input.progress,
            assigned_employees: dedup_preserving_order(input.assigned_employees),
            project_id: input.project_id,
            created_by: by.clone(),
            created_at: now,
            updated_at: now,
            completed_at: None,
            expected_start_at: input.expected_start_at,
            expected_end_at: input.expected_end_at,
            history: vec![history::created(&by, now)],
        };
        apply_completion_rules(&mut task, true, true, now);
        debug!(task_id = %task.id, status = %task.status, by = %by, "task created");

        self.tasks.push(task);
        self.tasks.last()
    }

    /// Merge `patch` into task `id`, re-apply the completion rules and, when
    /// a draft is supplied, append an audit entry. Returns false when the
    /// task does not exist.
    pub fn patch(&mut self, id: &str, patch: TaskPatch, audit: Option<AuditDraft>) -> bool {
        let now = self.clock.now();
        let actor = self.actor().to_string();
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            debug!(task_id = id, "patch on missing task ignored");
            return false;
        };

        let before = task.clone();
        let status_set = patch.status.is_some();
        let progress_set = patch.progress.is_some();
        merge(task, patch, now);
        apply_completion_rules(task, status_set, progress_set, now);

        if let Some(draft) = audit {
            let entry = history::record(draft, &before, task, now, &actor);
            history::append(&mut task.history, entry);
        }
        debug!(task_id = id, status = %task.status, progress = task.progress, "task patched");
        true
    }

    /// Remove task `id`. Returns false when it did not exist.
    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        let removed = self.tasks.len() != before;
        if removed {
            debug!(task_id = id, "task deleted");
        }
        removed
    }

    /// Flip a task between completed and working.
    ///
    /// Completed tasks revert to `working` with progress clamped to 99 and
    /// `completedAt` cleared; anything else becomes completed at 100%.
    pub fn toggle_completed(&mut self, id: &str) -> bool {
        let Some(task) = self.get(id) else {
            return false;
        };
        let now = self.clock.now();
        let from_status = task.status;
        let from_progress = task.progress;

        let (patch, mut draft) = if from_status.is_completed() {
            (
                TaskPatch {
                    status: Some(Status::Working),
                    progress: Some(from_progress.min(99)),
                    completed_at: Some(None),
                    updated_at: Some(now),
                    ..Default::default()
                },
                AuditDraft::new(AuditAction::StatusChanged, "Marked as not completed."),
            )
        } else {
            (
                TaskPatch {
                    status: Some(Status::Completed),
                    progress: Some(100),
                    updated_at: Some(now),
                    ..Default::default()
                },
                AuditDraft::new(AuditAction::Completed, "Marked as completed."),
            )
        };

        let to_status = patch.status.unwrap_or(from_status);
        let to_progress = patch.progress.unwrap_or(from_progress);
        let mut changes = BTreeMap::new();
        changes.insert(
            "status".to_string(),
            FieldChange { from: json!(from_status), to: json!(to_status) },
        );
        changes.insert(
            "progress".to_string(),
            FieldChange { from: json!(from_progress), to: json!(to_progress) },
        );
        draft.changes = Some(changes);

        self.patch(id, patch, Some(draft))
    }
}

fn merge(task: &mut Task, patch: TaskPatch, now: DateTime<Utc>) {
    if let Some(v) = patch.subject {
        task.subject = v;
    }
    if let Some(v) = patch.detail {
        task.detail = v;
    }
    if let Some(v) = patch.status {
        task.status = v;
    }
    if let Some(v) = patch.priority {
        task.priority = v;
    }
    if let Some(v) = patch.progress {
        task.progress = v;
    }
    if let Some(v) = patch.project_id {
        task.project_id = v;
    }
    if let Some(v) = patch.assigned_employees {
        task.assigned_employees = dedup_preserving_order(v);
    }
    if let Some(v) = patch.completed_at {
        task.completed_at = v;
    }
    if let Some(v) = patch.expected_start_at {
        task.expected_start_at = v;
    }
    if let Some(v) = patch.expected_end_at {
        task.expected_end_at = v;
    }
    task.updated_at = patch.updated_at.unwrap_or(now);
}

/// Couple status and progress, then align `completedAt` with the result.
///
/// The flags say which of the two fields the caller set explicitly. When
/// only one was set it wins over the stale value of the other; when both
/// were set, completion wins.
fn apply_completion_rules(task: &mut Task, status_set: bool, progress_set: bool, now: DateTime<Utc>) {
    task.progress = task.progress.min(100);

    if status_set && !progress_set && !task.status.is_completed() && task.progress == 100 {
        task.progress = 99;
    }
    if progress_set && !status_set && task.status.is_completed() && task.progress < 100 {
        task.status = Status::Working;
    }

    if task.status.is_completed() || task.progress == 100 {
        task.status = Status::Completed;
        task.progress = 100;
        if task.completed_at.is_none() {
            task.completed_at = Some(now);
        }
    } else {
        task.completed_at = None;
    }
}

fn dedup_preserving_order(ids: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}
