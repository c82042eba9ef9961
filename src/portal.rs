//! The portal service: stores, directory and session behind one owner.
//!
//! `Portal` is built explicitly from a [`KeyValueStore`], a [`Config`] and a
//! [`Directory`] and is handed to whatever drives it (the CLI, the TUI,
//! tests). Store primitives stay silent on unknown ids; the portal turns
//! those cases into [`Error::NotFound`] and checks [`policy`] before every
//! mutation. Each mutating call persists the affected collections before
//! returning.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::config::Config;
use crate::directory::{Directory, Session};
use crate::error::{Error, Result};
use crate::fields::{AuditAction, Status};
use crate::notification::{
    project_notifications, Notification, NotificationQuery, NotificationStore, NotificationType,
    NotificationView,
};
use crate::policy;
use crate::storage::{self, KeyValueStore};
use crate::store::{Clock, SystemClock, TaskStore};
use crate::task::{AuditDraft, Task, TaskInput, TaskPatch};
use crate::view::{project_tasks, ModeKind, Page, TaskQuery, TaskView, Viewer};

/// A notification to deliver, as entered by a user.
#[derive(Debug, Clone, Default)]
pub struct NotificationDraft {
    pub user_id: String,
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub redirect_path: Option<String>,
}

pub struct Portal<S: KeyValueStore> {
    store: S,
    config: Config,
    directory: Directory,
    tasks: TaskStore,
    notifications: NotificationStore,
    session: Option<Session>,
}

impl<S: KeyValueStore> Portal<S> {
    /// Rehydrate every collection from `store`.
    pub fn init(store: S, config: Config, directory: Directory) -> Result<Self> {
        Self::init_with_clock(store, config, directory, SystemClock)
    }

    pub fn init_with_clock(
        store: S,
        config: Config,
        directory: Directory,
        clock: impl Clock + 'static,
    ) -> Result<Self> {
        let directory = directory.with_hr_designation(config.hr_designation_id.clone());
        let tasks: Vec<Task> = storage::load_json(&store, storage::KEY_TASKS)?.unwrap_or_default();
        let high_water: u64 = storage::load_json(&store, storage::KEY_TASK_SEQ)?.unwrap_or(0);
        let notifications: Vec<Notification> =
            storage::load_json(&store, storage::KEY_NOTIFICATIONS)?.unwrap_or_default();
        let saved: Option<Session> = storage::load_json(&store, storage::KEY_USER)?;

        // The directory is the source of truth for the role and profile.
        let session = saved.and_then(|s| {
            let employee = directory.employee(s.employee_id())?;
            let is_hr = directory.is_hr(employee);
            let mut employee = employee.clone();
            employee.password = None;
            Some(Session { employee, is_hr })
        });

        let mut tasks = TaskStore::from_snapshot(tasks, high_water).with_clock(clock);
        tasks.set_actor(session.as_ref().map(|s| s.employee_id().to_string()));
        debug!(
            tasks = tasks.len(),
            notifications = notifications.len(),
            logged_in = session.is_some(),
            "portal initialised"
        );

        Ok(Portal {
            store,
            config,
            directory,
            tasks,
            notifications: NotificationStore::new(notifications),
            session,
        })
    }

    /// Persist tasks, the id sequence and notifications.
    pub fn flush(&mut self) -> Result<()> {
        storage::save_json(&mut self.store, storage::KEY_TASKS, self.tasks.tasks())?;
        storage::save_json(&mut self.store, storage::KEY_TASK_SEQ, &self.tasks.high_water())?;
        storage::save_json(&mut self.store, storage::KEY_NOTIFICATIONS, self.notifications.all())?;
        Ok(())
    }

    /// Flush and hand the underlying store back.
    pub fn teardown(mut self) -> Result<S> {
        self.flush()?;
        Ok(self.store)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    pub fn task_store(&self) -> &TaskStore {
        &self.tasks
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.tasks.now()
    }

    // ---- session ----

    pub fn login(&mut self, email: &str, password: &str) -> Result<&Session> {
        let session = self.directory.authenticate(email, password)?;
        storage::save_json(&mut self.store, storage::KEY_USER, &session)?;
        self.tasks.set_actor(Some(session.employee_id().to_string()));
        info!(employee_id = %session.employee_id(), is_hr = session.is_hr, "logged in");
        Ok(&*self.session.insert(session))
    }

    pub fn logout(&mut self) -> Result<()> {
        self.store.remove(storage::KEY_USER)?;
        self.tasks.set_actor(None);
        if let Some(s) = self.session.take() {
            info!(employee_id = %s.employee_id(), "logged out");
        }
        Ok(())
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn require_session(&self) -> Result<&Session> {
        self.session.as_ref().ok_or(Error::NotLoggedIn)
    }

    pub fn viewer(&self) -> Result<Viewer> {
        let s = self.require_session()?;
        Ok(Viewer {
            employee_id: s.employee_id().to_string(),
            is_hr: s.is_hr,
        })
    }

    // ---- tasks ----

    /// A task the current user may see.
    pub fn task(&self, id: &str) -> Result<&Task> {
        let viewer = self.viewer()?;
        self.tasks
            .get(id)
            .filter(|t| viewer.can_see(t) || policy::can_manage(&viewer, t))
            .ok_or_else(|| not_found("task", id))
    }

    pub fn visible_tasks(&self, query: &TaskQuery) -> Result<Vec<&Task>> {
        let viewer = self.viewer()?;
        Ok(project_tasks(self.tasks.tasks(), &viewer, query, &self.directory.projects))
    }

    pub fn task_page(&self, view: &TaskView) -> Result<Page<&Task>> {
        let filtered = self.visible_tasks(view.query())?;
        Ok(view.slice(&filtered))
    }

    /// Create a task for the current user.
    ///
    /// HR picks the project and assignees (defaulting to the first project
    /// and to themselves); everyone else gets a self-assigned task in the
    /// first project.
    pub fn create_task(&mut self, mut input: TaskInput) -> Result<&Task> {
        let viewer = self.viewer()?;
        input.subject = input.subject.trim().to_string();
        input.detail = input.detail.trim().to_string();
        validate_fields(&input.subject, input.progress, input.expected_start_at, input.expected_end_at)?;

        let first_project = self.directory.first_project().map(|p| p.id.clone()).unwrap_or_default();
        if viewer.is_hr {
            if input.project_id.trim().is_empty() {
                input.project_id = first_project;
            }
            if input.assigned_employees.is_empty() {
                input.assigned_employees = vec![viewer.employee_id.clone()];
            }
            self.check_references(&input.project_id, &input.assigned_employees)?;
        } else {
            input.project_id = first_project;
            input.assigned_employees = vec![viewer.employee_id.clone()];
        }

        if input.id.is_none() && self.tasks.next_id().is_none() {
            return Err(Error::Validation("No task ids are left.".into()));
        }
        let id = match self.tasks.create(input) {
            Some(task) => task.id.clone(),
            None => return Err(Error::Validation("A task with that id already exists.".into())),
        };
        info!(task_id = %id, by = %viewer.employee_id, "task created");
        self.flush()?;
        self.task(&id)
    }

    /// Edit task fields. Project and assignee changes are only applied for HR.
    pub fn edit_task(&mut self, id: &str, mut patch: TaskPatch) -> Result<&Task> {
        let viewer = self.viewer()?;
        let task = self.manageable(&viewer, id, "edit task")?;

        if !viewer.is_hr && (patch.project_id.is_some() || patch.assigned_employees.is_some()) {
            debug!(task_id = id, "ignoring project/assignee change from non-HR editor");
            patch.project_id = None;
            patch.assigned_employees = None;
        }
        if let Some(subject) = patch.subject.as_mut() {
            *subject = subject.trim().to_string();
        }
        if let Some(detail) = patch.detail.as_mut() {
            *detail = detail.trim().to_string();
        }
        validate_fields(
            patch.subject.as_deref().unwrap_or(&task.subject),
            patch.progress.unwrap_or(task.progress),
            patch.expected_start_at.unwrap_or(task.expected_start_at),
            patch.expected_end_at.unwrap_or(task.expected_end_at),
        )?;
        if patch.project_id.is_some() || patch.assigned_employees.is_some() {
            let project = patch.project_id.as_deref().unwrap_or(&task.project_id).to_string();
            let assignees = patch
                .assigned_employees
                .clone()
                .unwrap_or_else(|| task.assigned_employees.clone());
            if assignees.is_empty() {
                return Err(Error::Validation("At least one assignee is required.".into()));
            }
            self.check_references(&project, &assignees)?;
        }

        self.tasks.patch(
            id,
            patch,
            Some(AuditDraft::new(AuditAction::Edited, "Edited task fields.")),
        );
        self.flush()?;
        self.task(id)
    }

    /// Report progress. Reaching 100 completes the task.
    pub fn set_progress(&mut self, id: &str, progress: u8) -> Result<&Task> {
        let viewer = self.viewer()?;
        let task = self.manageable(&viewer, id, "update progress on task")?;
        if progress > 100 {
            return Err(Error::Validation("Progress must be between 0 and 100.".into()));
        }
        let draft = if progress == 100 && !task.status.is_completed() {
            AuditDraft::new(AuditAction::Completed, "Marked as completed.")
        } else {
            AuditDraft::new(AuditAction::ProgressUpdated, format!("Progress updated to {progress}%."))
        };
        self.tasks.patch(id, TaskPatch::progress(progress), Some(draft));
        self.flush()?;
        self.task(id)
    }

    /// Move a task to `status`. Any status may follow any other.
    pub fn set_status(&mut self, id: &str, status: Status) -> Result<&Task> {
        let viewer = self.viewer()?;
        let task = self.manageable(&viewer, id, "change status of task")?;
        let draft = if status.is_completed() && !task.status.is_completed() {
            AuditDraft::new(AuditAction::Completed, "Marked as completed.")
        } else {
            AuditDraft::new(AuditAction::StatusChanged, format!("Status changed to {status}."))
        };
        self.tasks.patch(id, TaskPatch::status(status), Some(draft));
        self.flush()?;
        self.task(id)
    }

    pub fn toggle_task(&mut self, id: &str) -> Result<&Task> {
        let viewer = self.viewer()?;
        self.toggleable(&viewer, id, "toggle task")?;
        self.tasks.toggle_completed(id);
        self.flush()?;
        self.task(id)
    }

    pub fn delete_task(&mut self, id: &str) -> Result<()> {
        let viewer = self.viewer()?;
        self.manageable(&viewer, id, "delete task")?;
        self.tasks.delete(id);
        info!(task_id = id, by = %viewer.employee_id, "task deleted");
        self.flush()
    }

    fn manageable(&self, viewer: &Viewer, id: &str, action: &'static str) -> Result<Task> {
        let task = self.tasks.get(id).ok_or_else(|| not_found("task", id))?;
        if !policy::can_manage(viewer, task) {
            return Err(forbidden(viewer, action, id));
        }
        Ok(task.clone())
    }

    fn toggleable(&self, viewer: &Viewer, id: &str, action: &'static str) -> Result<Task> {
        let task = self.tasks.get(id).ok_or_else(|| not_found("task", id))?;
        if !policy::can_toggle(viewer, task) {
            return Err(forbidden(viewer, action, id));
        }
        Ok(task.clone())
    }

    fn check_references(&self, project_id: &str, assignees: &[String]) -> Result<()> {
        if !project_id.is_empty() && self.directory.project(project_id).is_none() {
            return Err(Error::Validation(format!("Unknown project {project_id}.")));
        }
        if let Some(unknown) = assignees.iter().find(|e| self.directory.employee(e).is_none()) {
            return Err(Error::Validation(format!("Unknown employee {unknown}.")));
        }
        Ok(())
    }

    // ---- view preferences ----

    pub fn task_view(&self) -> Result<TaskView> {
        let (kind, size) = self.load_view_prefs(storage::KEY_TASK_VIEW, storage::KEY_TASK_PAGE_SIZE)?;
        Ok(TaskView::with_reveal_step(kind, size, self.config.reveal_step))
    }

    pub fn save_task_view(&mut self, view: &TaskView) -> Result<()> {
        self.save_view_prefs(
            storage::KEY_TASK_VIEW,
            storage::KEY_TASK_PAGE_SIZE,
            view.mode().kind(),
            view.page_size(),
        )
    }

    pub fn notification_view(&self) -> Result<NotificationView> {
        let (kind, size) = self.load_view_prefs(storage::KEY_NOTIF_VIEW, storage::KEY_NOTIF_PAGE_SIZE)?;
        Ok(NotificationView::with_reveal_step(kind, size, self.config.reveal_step))
    }

    pub fn save_notification_view(&mut self, view: &NotificationView) -> Result<()> {
        self.save_view_prefs(
            storage::KEY_NOTIF_VIEW,
            storage::KEY_NOTIF_PAGE_SIZE,
            view.mode().kind(),
            view.page_size(),
        )
    }

    fn load_view_prefs(&self, mode_key: &str, size_key: &str) -> Result<(ModeKind, usize)> {
        let kind: ModeKind = storage::load_json(&self.store, mode_key)?.unwrap_or_default();
        let size = storage::load_json::<i64>(&self.store, size_key)?
            .filter(|n| *n > 0)
            .map(|n| n as usize)
            .unwrap_or(self.config.default_page_size);
        Ok((kind, size))
    }

    fn save_view_prefs(&mut self, mode_key: &str, size_key: &str, kind: ModeKind, size: usize) -> Result<()> {
        storage::save_json(&mut self.store, mode_key, &kind)?;
        storage::save_json(&mut self.store, size_key, &size)
    }

    // ---- notifications ----

    pub fn notifications(&self, query: &NotificationQuery) -> Result<Vec<&Notification>> {
        let user = self.require_session()?.employee_id();
        Ok(project_notifications(self.notifications.for_user(user), query))
    }

    pub fn notification_page(&self, view: &NotificationView) -> Result<Page<&Notification>> {
        let filtered = self.notifications(view.query())?;
        Ok(view.slice(&filtered))
    }

    pub fn unread_count(&self) -> Result<usize> {
        let user = self.require_session()?.employee_id();
        Ok(self.notifications.unread_count(user))
    }

    /// Mark a notification read and return it (for its redirect path).
    pub fn open_notification(&mut self, id: &str) -> Result<&Notification> {
        self.set_notification_opened(id, true)?;
        self.own_notification(id)
    }

    pub fn set_notification_opened(&mut self, id: &str, opened: bool) -> Result<()> {
        self.own_notification(id)?;
        self.notifications.mark_opened(id, opened);
        self.flush()
    }

    pub fn mark_all_notifications(&mut self, opened: bool) -> Result<usize> {
        let user = self.require_session()?.employee_id().to_string();
        let touched = self.notifications.mark_all_opened(&user, opened);
        self.flush()?;
        Ok(touched)
    }

    pub fn delete_notification(&mut self, id: &str) -> Result<()> {
        self.own_notification(id)?;
        self.notifications.delete(id);
        self.flush()
    }

    pub fn clear_notifications(&mut self) -> Result<usize> {
        let user = self.require_session()?.employee_id().to_string();
        let removed = self.notifications.clear_for_user(&user);
        self.flush()?;
        Ok(removed)
    }

    /// Deliver a notification from the current user. Only HR may notify
    /// other employees.
    pub fn notify(&mut self, draft: NotificationDraft) -> Result<&Notification> {
        let viewer = self.viewer()?;
        if !policy::can_edit_employee(&viewer, &draft.user_id) {
            return Err(Error::Forbidden {
                actor: viewer.employee_id,
                action: "notify employee",
                target: draft.user_id,
            });
        }
        if self.directory.employee(&draft.user_id).is_none() {
            return Err(Error::Validation(format!("Unknown employee {}.", draft.user_id)));
        }
        let title = draft.title.trim().to_string();
        if title.is_empty() {
            return Err(Error::Validation("Title is required.".into()));
        }

        let now = self.now();
        let base = format!("NTF-{}", now.timestamp_millis());
        let mut id = base.clone();
        let mut n = 1;
        while self.notifications.get(&id).is_some() {
            n += 1;
            id = format!("{base}-{n}");
        }
        let sender_name = self.directory.resolve_employee_name(&viewer.employee_id);
        self.notifications.add(Notification {
            id: id.clone(),
            user_id: draft.user_id,
            kind: draft.kind,
            title,
            message: draft.message.trim().to_string(),
            sender_name,
            redirect_path: draft.redirect_path.filter(|p| !p.trim().is_empty()),
            created_at: now,
            opened: false,
        });
        self.flush()?;
        self.notifications.get(&id).ok_or_else(|| not_found("notification", &id))
    }

    fn own_notification(&self, id: &str) -> Result<&Notification> {
        let user = self.require_session()?.employee_id();
        self.notifications
            .get(id)
            .filter(|n| n.user_id == user)
            .ok_or_else(|| not_found("notification", id))
    }
}

fn not_found(kind: &'static str, id: &str) -> Error {
    Error::NotFound { kind, id: id.to_string() }
}

fn forbidden(viewer: &Viewer, action: &'static str, id: &str) -> Error {
    Error::Forbidden {
        actor: viewer.employee_id.clone(),
        action,
        target: id.to_string(),
    }
}

/// Input checks applied before anything reaches the store.
fn validate_fields(
    subject: &str,
    progress: u8,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Result<()> {
    if subject.trim().is_empty() {
        return Err(Error::Validation("Subject is required.".into()));
    }
    if progress > 100 {
        return Err(Error::Validation("Progress must be between 0 and 100.".into()));
    }
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            return Err(Error::Validation("Expected end cannot be before expected start.".into()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{Priority, Tab};
    use crate::storage::MemoryStore;
    use crate::store::ManualClock;
    use chrono::{Duration, TimeZone};

    const HR: (&str, &str) = ("asha.silva@example.com", "asha-hr-2025");
    const RAVI: (&str, &str) = ("ravi.fernando@example.com", "ravi-sales-2025");
    const MEI: (&str, &str) = ("mei.tan@example.com", "mei-dev-2025");

    fn clock() -> ManualClock {
        ManualClock::new(Utc.with_ymd_and_hms(2025, 12, 1, 9, 0, 0).unwrap())
    }

    fn portal(clock: &ManualClock) -> Portal<MemoryStore> {
        Portal::init_with_clock(MemoryStore::new(), Config::default(), Directory::seed(), clock.clone()).unwrap()
    }

    fn login(p: &mut Portal<MemoryStore>, who: (&str, &str)) {
        p.login(who.0, who.1).unwrap();
    }

    fn input(subject: &str) -> TaskInput {
        TaskInput {
            subject: subject.into(),
            ..Default::default()
        }
    }

    #[test]
    fn mutations_require_a_session() {
        let clock = clock();
        let mut p = portal(&clock);
        assert!(matches!(p.create_task(input("x")), Err(Error::NotLoggedIn)));
        assert!(matches!(p.unread_count(), Err(Error::NotLoggedIn)));
    }

    #[test]
    fn login_errors_carry_user_messages() {
        let clock = clock();
        let mut p = portal(&clock);
        let err = p.login("  ", "").unwrap_err();
        assert_eq!(err.to_string(), "Office email and password are required.");
        let err = p.login(HR.0, "wrong").unwrap_err();
        assert_eq!(err.to_string(), "Invalid email or password");
        assert!(p.session().is_none());
    }

    #[test]
    fn non_hr_tasks_are_self_assigned_in_first_project() {
        let clock = clock();
        let mut p = portal(&clock);
        login(&mut p, RAVI);
        let mut form = input("  Call supplier  ");
        form.project_id = "PRJ-003".into();
        form.assigned_employees = vec!["EMP-0003".into()];

        let task = p.create_task(form).unwrap();
        assert_eq!(task.subject, "Call supplier");
        assert_eq!(task.created_by, "EMP-0002");
        assert_eq!(task.project_id, "PRJ-001");
        assert_eq!(task.assigned_employees, ["EMP-0002"]);
    }

    #[test]
    fn hr_chooses_project_and_assignees() {
        let clock = clock();
        let mut p = portal(&clock);
        login(&mut p, HR);
        let mut form = input("Audit leave balances");
        form.project_id = "PRJ-002".into();
        form.assigned_employees = vec!["EMP-0003".into(), "EMP-0004".into()];
        let task = p.create_task(form).unwrap();
        assert_eq!(task.project_id, "PRJ-002");
        assert_eq!(task.assigned_employees, ["EMP-0003", "EMP-0004"]);

        let mut bad = input("Ghost");
        bad.assigned_employees = vec!["EMP-9999".into()];
        assert!(matches!(p.create_task(bad), Err(Error::Validation(_))));
    }

    #[test]
    fn create_validation() {
        let clock = clock();
        let mut p = portal(&clock);
        login(&mut p, RAVI);
        assert!(matches!(p.create_task(input("   ")), Err(Error::Validation(_))));

        let mut over = input("Over");
        over.progress = 101;
        assert!(matches!(p.create_task(over), Err(Error::Validation(_))));

        let mut backwards = input("Backwards");
        backwards.expected_start_at = Some(clock.now());
        backwards.expected_end_at = Some(clock.now() - Duration::hours(1));
        assert!(matches!(p.create_task(backwards), Err(Error::Validation(_))));
        assert!(p.task_store().is_empty());
    }

    #[test]
    fn only_creator_or_hr_may_edit_and_delete() {
        let clock = clock();
        let mut p = portal(&clock);
        login(&mut p, RAVI);
        let id = p.create_task(input("Mine")).unwrap().id.clone();

        login(&mut p, MEI);
        assert!(matches!(p.delete_task(&id), Err(Error::Forbidden { .. })));
        assert!(matches!(p.delete_task("TASK-404"), Err(Error::NotFound { .. })));

        login(&mut p, HR);
        let patch = TaskPatch {
            subject: Some("Renamed".into()),
            priority: Some(Priority::High),
            ..Default::default()
        };
        let task = p.edit_task(&id, patch).unwrap();
        assert_eq!(task.subject, "Renamed");
        let last = task.history.last().unwrap();
        assert_eq!(last.action, AuditAction::Edited);
        assert_eq!(last.by, "EMP-0001");
        let changes = last.changes.as_ref().unwrap();
        assert!(changes.contains_key("subject"));
        assert!(changes.contains_key("priority"));

        p.delete_task(&id).unwrap();
        assert!(p.task_store().is_empty());
    }

    #[test]
    fn non_hr_edit_keeps_project_and_assignees() {
        let clock = clock();
        let mut p = portal(&clock);
        login(&mut p, RAVI);
        let id = p.create_task(input("Mine")).unwrap().id.clone();
        let patch = TaskPatch {
            project_id: Some("PRJ-003".into()),
            assigned_employees: Some(vec!["EMP-0003".into()]),
            detail: Some("more".into()),
            ..Default::default()
        };
        let task = p.edit_task(&id, patch).unwrap();
        assert_eq!(task.project_id, "PRJ-001");
        assert_eq!(task.assigned_employees, ["EMP-0002"]);
        assert_eq!(task.detail, "more");
    }

    #[test]
    fn assignees_may_toggle_but_not_edit_progress_or_status() {
        let clock = clock();
        let mut p = portal(&clock);
        login(&mut p, HR);
        let mut form = input("Shared");
        form.assigned_employees = vec!["EMP-0003".into()];
        let id = p.create_task(form).unwrap().id.clone();

        login(&mut p, MEI);
        clock.advance(Duration::minutes(5));
        assert!(matches!(p.set_progress(&id, 40), Err(Error::Forbidden { .. })));
        assert!(matches!(p.set_status(&id, Status::Canceled), Err(Error::Forbidden { .. })));
        assert!(matches!(p.edit_task(&id, TaskPatch::default()), Err(Error::Forbidden { .. })));
        assert!(matches!(p.delete_task(&id), Err(Error::Forbidden { .. })));
        assert_eq!(p.task(&id).unwrap().status, Status::Open);
        assert_eq!(p.task(&id).unwrap().history.len(), 1);

        let task = p.toggle_task(&id).unwrap();
        assert_eq!(task.status, Status::Completed);
        assert_eq!(task.history.last().unwrap().action, AuditAction::Completed);

        let task = p.toggle_task(&id).unwrap();
        assert_eq!(task.status, Status::Working);
        assert_eq!(task.progress, 99);
        assert!(task.completed_at.is_none());

        login(&mut p, HR);
        let task = p.set_progress(&id, 100).unwrap();
        assert_eq!(task.status, Status::Completed);
        assert_eq!(task.history.last().unwrap().action, AuditAction::Completed);
        let task = p.set_status(&id, Status::Review).unwrap();
        assert_eq!(task.status, Status::Review);
        assert_eq!(task.history.last().unwrap().action, AuditAction::StatusChanged);

        login(&mut p, RAVI);
        assert!(matches!(p.toggle_task(&id), Err(Error::Forbidden { .. })));
        assert!(matches!(p.task(&id), Err(Error::NotFound { .. })));
    }

    #[test]
    fn creators_report_progress_on_their_own_tasks() {
        let clock = clock();
        let mut p = portal(&clock);
        login(&mut p, MEI);
        let id = p.create_task(input("Mine")).unwrap().id.clone();
        let task = p.set_progress(&id, 40).unwrap();
        assert_eq!(task.progress, 40);
        assert_eq!(task.history.last().unwrap().action, AuditAction::ProgressUpdated);
    }

    #[test]
    fn exhausted_id_sequence_is_a_validation_error() {
        let clock = clock();
        let mut p = portal(&clock);
        login(&mut p, HR);
        let mut form = input("Imported");
        form.id = Some(format!("TASK-{}", u64::MAX));
        p.create_task(form).unwrap();
        assert!(matches!(p.create_task(input("Next")), Err(Error::Validation(_))));
    }

    #[test]
    fn hr_open_tab_excludes_closed_tasks_across_everyone() {
        let clock = clock();
        let mut p = portal(&clock);
        login(&mut p, RAVI);
        let ravi_done = p.create_task(input("Ravi done")).unwrap().id.clone();
        p.toggle_task(&ravi_done).unwrap();
        p.create_task(input("Ravi open")).unwrap();

        login(&mut p, MEI);
        let mei_cancel = p.create_task(input("Mei canceled")).unwrap().id.clone();
        p.set_status(&mei_cancel, Status::Canceled).unwrap();
        p.create_task(input("Mei pending")).unwrap();

        login(&mut p, HR);
        let query = TaskQuery { tab: Tab::Open, ..Default::default() };
        let subjects: Vec<_> = p
            .visible_tasks(&query)
            .unwrap()
            .iter()
            .map(|t| t.subject.as_str())
            .collect();
        assert_eq!(subjects.len(), 2);
        assert!(subjects.contains(&"Ravi open"));
        assert!(subjects.contains(&"Mei pending"));

        login(&mut p, MEI);
        let mine = p.visible_tasks(&TaskQuery::default()).unwrap();
        assert!(mine.iter().all(|t| t.is_assigned_to("EMP-0003")));
        assert_eq!(mine.len(), 2);
    }

    #[test]
    fn state_survives_teardown_and_ids_do_not_repeat() {
        let clock = clock();
        let mut p = portal(&clock);
        login(&mut p, RAVI);
        p.create_task(input("One")).unwrap();
        let second = p.create_task(input("Two")).unwrap().id.clone();
        p.delete_task(&second).unwrap();
        let store = p.teardown().unwrap();

        let mut p = Portal::init_with_clock(store, Config::default(), Directory::seed(), clock.clone()).unwrap();
        assert_eq!(p.session().unwrap().employee_id(), "EMP-0002");
        assert_eq!(p.task_store().len(), 1);
        let third = p.create_task(input("Three")).unwrap();
        assert_eq!(third.id, "TASK-003");

        p.logout().unwrap();
        let store = p.teardown().unwrap();
        let p = Portal::init(store, Config::default(), Directory::seed()).unwrap();
        assert!(p.session().is_none());
    }

    #[test]
    fn view_preferences_round_trip() {
        let clock = clock();
        let mut p = portal(&clock);
        let mut view = p.task_view().unwrap();
        assert_eq!(view.mode().kind(), ModeKind::LoadMore);
        view.set_mode(ModeKind::Pagination);
        view.set_page_size(12);
        p.save_task_view(&view).unwrap();

        let restored = p.task_view().unwrap();
        assert_eq!(restored.mode().kind(), ModeKind::Pagination);
        assert_eq!(restored.page_size(), 12);
        assert_eq!(restored.page(), 1);
    }

    #[test]
    fn notifications_are_scoped_to_the_session() {
        let clock = clock();
        let mut p = portal(&clock);
        login(&mut p, RAVI);
        let err = p
            .notify(NotificationDraft {
                user_id: "EMP-0003".into(),
                title: "Hi".into(),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, Error::Forbidden { .. }));

        login(&mut p, HR);
        let sent = p
            .notify(NotificationDraft {
                user_id: "EMP-0003".into(),
                kind: NotificationType::Task,
                title: "Task assigned".into(),
                message: "Audit leave balances".into(),
                redirect_path: Some("/tasks".into()),
            })
            .unwrap()
            .clone();
        assert_eq!(sent.sender_name, "Asha Silva");
        assert_eq!(p.unread_count().unwrap(), 0);
        assert!(matches!(p.open_notification(&sent.id), Err(Error::NotFound { .. })));

        login(&mut p, MEI);
        assert_eq!(p.unread_count().unwrap(), 1);
        let opened = p.open_notification(&sent.id).unwrap();
        assert!(opened.opened);
        assert_eq!(opened.redirect_path.as_deref(), Some("/tasks"));
        assert_eq!(p.unread_count().unwrap(), 0);

        let view = p.notification_view().unwrap();
        assert_eq!(p.notification_page(&view).unwrap().total, 1);
        assert_eq!(p.clear_notifications().unwrap(), 1);
        assert_eq!(p.notifications(&NotificationQuery::default()).unwrap().len(), 0);
    }
}
