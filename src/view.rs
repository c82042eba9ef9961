//! Filtered, sorted and paginated projections of the task list.
//!
//! Projection happens in two steps. [`project_tasks`] narrows the full task
//! collection to what a viewer may see and what the query asks for, newest
//! first. [`ViewState::slice`] then cuts the visible window out of that list
//! with one of two strategies:
//!
//! - incremental reveal: a growing prefix, extended by `reveal_step` on demand
//!   or when the cursor comes close to the last revealed row;
//! - fixed paging: discrete pages of `page_size` items.
//!
//! Any change to the query, the pagination strategy or the page size resets
//! the window to the first page / first `reveal_step` items.

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::directory::Project;
use crate::error::ParseEnumError;
use crate::fields::*;
use crate::task::Task;

/// Items revealed initially and per "load more" step.
pub const REVEAL_STEP: usize = 8;
/// Default page size for fixed paging.
pub const DEFAULT_PAGE_SIZE: usize = 8;
/// Page sizes offered by the UI.
pub const PAGE_SIZE_OPTIONS: [usize; 5] = [6, 8, 10, 12, 16];
/// Rows from the end of the revealed list at which more are revealed.
pub const PROXIMITY_ROWS: usize = 2;

/// Who is looking at the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub employee_id: String,
    pub is_hr: bool,
}

impl Viewer {
    /// HR sees every task; everyone else sees tasks assigned to them.
    pub fn can_see(&self, task: &Task) -> bool {
        self.is_hr || task.is_assigned_to(&self.employee_id)
    }
}

/// Query over the task list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskQuery {
    pub text: String,
    pub tab: Tab,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
}

impl TaskQuery {
    fn admits(&self, task: &Task) -> bool {
        self.tab.admits(task.status)
            && self.status.map_or(true, |s| task.status == s)
            && self.priority.map_or(true, |p| task.priority == p)
    }
}

/// Lowercased search haystack for a task.
fn haystack(task: &Task, projects: &[Project]) -> String {
    let project_name = projects
        .iter()
        .find(|p| p.id == task.project_id)
        .map(|p| p.name.as_str())
        .unwrap_or("");
    let mut parts: Vec<&str> = vec![
        task.id.as_str(),
        task.subject.as_str(),
        task.detail.as_str(),
        task.status.as_str(),
        task.priority.as_str(),
        task.project_id.as_str(),
        project_name,
    ];
    parts.extend(task.assigned_employees.iter().map(String::as_str));
    parts.push(task.created_by.as_str());
    parts.join(" ").to_lowercase()
}

/// Tasks visible to `viewer` that match `query`, newest first.
///
/// The sort is stable, so tasks created at the same instant keep their
/// store order.
pub fn project_tasks<'a>(
    tasks: &'a [Task],
    viewer: &Viewer,
    query: &TaskQuery,
    projects: &[Project],
) -> Vec<&'a Task> {
    let needle = query.text.trim().to_lowercase();
    let mut out: Vec<&Task> = tasks
        .iter()
        .filter(|t| viewer.can_see(t))
        .filter(|t| query.admits(t))
        .filter(|t| needle.is_empty() || haystack(t, projects).contains(&needle))
        .collect();
    out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    out
}

/// Which pagination strategy is active, as persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ModeKind {
    #[default]
    #[value(name = "loadmore", alias = "load-more")]
    LoadMore,
    #[value(alias = "pages")]
    Pagination,
}

impl ModeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModeKind::LoadMore => "loadmore",
            ModeKind::Pagination => "pagination",
        }
    }

    pub fn toggled(&self) -> ModeKind {
        match self {
            ModeKind::LoadMore => ModeKind::Pagination,
            ModeKind::Pagination => ModeKind::LoadMore,
        }
    }
}

impl fmt::Display for ModeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModeKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "loadmore" => Ok(ModeKind::LoadMore),
            "pagination" => Ok(ModeKind::Pagination),
            other => Err(ParseEnumError {
                kind: "view mode",
                value: other.to_string(),
            }),
        }
    }
}

/// The visible window over a filtered list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    IncrementalReveal { visible_count: usize },
    FixedPaging { page: usize, page_size: usize },
}

impl ViewMode {
    pub fn kind(&self) -> ModeKind {
        match self {
            ViewMode::IncrementalReveal { .. } => ModeKind::LoadMore,
            ViewMode::FixedPaging { .. } => ModeKind::Pagination,
        }
    }
}

/// One window of results.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Size of the whole filtered list.
    pub total: usize,
    /// 1-based page number; always 1 in incremental reveal.
    pub page: usize,
    /// At least 1; always 1 in incremental reveal.
    pub total_pages: usize,
    /// Whether items exist beyond this window.
    pub has_more: bool,
}

/// Query plus window state for one list screen.
///
/// Every setter that changes what is filtered or how it is windowed resets
/// the window, so the view never lands on an empty page.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState<Q> {
    query: Q,
    mode: ViewMode,
    page_size: usize,
    reveal_step: usize,
}

impl<Q: Default> Default for ViewState<Q> {
    fn default() -> Self {
        ViewState::new(ModeKind::LoadMore, DEFAULT_PAGE_SIZE)
    }
}

impl<Q: Default> ViewState<Q> {
    pub fn new(kind: ModeKind, page_size: usize) -> Self {
        Self::with_reveal_step(kind, page_size, REVEAL_STEP)
    }

    pub fn with_reveal_step(kind: ModeKind, page_size: usize, reveal_step: usize) -> Self {
        let page_size = if page_size == 0 { DEFAULT_PAGE_SIZE } else { page_size };
        let reveal_step = reveal_step.max(1);
        let mut state = ViewState {
            query: Q::default(),
            mode: ViewMode::IncrementalReveal { visible_count: reveal_step },
            page_size,
            reveal_step,
        };
        state.set_mode(kind);
        state
    }
}

impl<Q> ViewState<Q> {
    pub fn query(&self) -> &Q {
        &self.query
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Current 1-based page (1 in incremental reveal).
    pub fn page(&self) -> usize {
        match self.mode {
            ViewMode::FixedPaging { page, .. } => page,
            ViewMode::IncrementalReveal { .. } => 1,
        }
    }

    /// Revealed item count (`reveal_step` in fixed paging).
    pub fn visible_count(&self) -> usize {
        match self.mode {
            ViewMode::IncrementalReveal { visible_count } => visible_count,
            ViewMode::FixedPaging { .. } => self.reveal_step,
        }
    }

    /// Put the window back at its start.
    pub fn reset(&mut self) {
        self.mode = match self.mode {
            ViewMode::IncrementalReveal { .. } => ViewMode::IncrementalReveal {
                visible_count: self.reveal_step,
            },
            ViewMode::FixedPaging { page_size, .. } => ViewMode::FixedPaging { page: 1, page_size },
        };
    }

    /// Apply an edit to the query; resets the window.
    pub fn update_query(&mut self, edit: impl FnOnce(&mut Q)) {
        edit(&mut self.query);
        self.reset();
    }

    pub fn set_query(&mut self, query: Q) {
        self.query = query;
        self.reset();
    }

    pub fn set_mode(&mut self, kind: ModeKind) {
        self.mode = match kind {
            ModeKind::LoadMore => ViewMode::IncrementalReveal {
                visible_count: self.reveal_step,
            },
            ModeKind::Pagination => ViewMode::FixedPaging {
                page: 1,
                page_size: self.page_size,
            },
        };
    }

    pub fn toggle_mode(&mut self) {
        self.set_mode(self.mode.kind().toggled());
    }

    /// Change the page size; zero is ignored. Resets the window.
    pub fn set_page_size(&mut self, page_size: usize) {
        if page_size > 0 {
            self.page_size = page_size;
        }
        if let ViewMode::FixedPaging { .. } = self.mode {
            self.mode = ViewMode::FixedPaging { page: 1, page_size: self.page_size };
        }
        self.reset();
    }

    pub fn total_pages(&self, total: usize) -> usize {
        match self.mode {
            ViewMode::FixedPaging { page_size, .. } => total.div_ceil(page_size).max(1),
            ViewMode::IncrementalReveal { .. } => 1,
        }
    }

    /// Reveal up to `reveal_step` more items, never past `total`.
    pub fn reveal_more(&mut self, total: usize) {
        if let ViewMode::IncrementalReveal { visible_count } = self.mode {
            self.mode = ViewMode::IncrementalReveal {
                visible_count: (visible_count + self.reveal_step).min(total),
            };
        }
    }

    /// Proximity signal: the cursor sits at `index` of the revealed rows.
    /// Reveals more when it is within [`PROXIMITY_ROWS`] of the end and more
    /// items exist. Returns whether anything was revealed.
    pub fn near_end(&mut self, index: usize, total: usize) -> bool {
        let ViewMode::IncrementalReveal { visible_count } = self.mode else {
            return false;
        };
        let shown = visible_count.min(total);
        if shown < total && index + PROXIMITY_ROWS >= shown {
            self.reveal_more(total);
            return true;
        }
        false
    }

    /// Jump to `page`, clamped to the available pages.
    pub fn goto_page(&mut self, page: usize, total: usize) {
        let last = self.total_pages(total);
        if let ViewMode::FixedPaging { page_size, .. } = self.mode {
            self.mode = ViewMode::FixedPaging {
                page: page.clamp(1, last),
                page_size,
            };
        }
    }

    pub fn next_page(&mut self, total: usize) {
        self.goto_page(self.page() + 1, total);
    }

    pub fn prev_page(&mut self, total: usize) {
        self.goto_page(self.page().saturating_sub(1), total);
    }

    /// Cut the current window out of `filtered`.
    pub fn slice<T: Clone>(&self, filtered: &[T]) -> Page<T> {
        let total = filtered.len();
        match self.mode {
            ViewMode::IncrementalReveal { visible_count } => {
                let end = visible_count.min(total);
                Page {
                    items: filtered[..end].to_vec(),
                    total,
                    page: 1,
                    total_pages: 1,
                    has_more: end < total,
                }
            }
            ViewMode::FixedPaging { page, page_size } => {
                let start = (page - 1).saturating_mul(page_size).min(total);
                let end = (start + page_size).min(total);
                Page {
                    items: filtered[start..end].to_vec(),
                    total,
                    page,
                    total_pages: self.total_pages(total),
                    has_more: end < total,
                }
            }
        }
    }
}

/// Task list view state.
pub type TaskView = ViewState<TaskQuery>;

impl ViewState<TaskQuery> {
    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.update_query(|q| q.text = text);
    }

    pub fn set_tab(&mut self, tab: Tab) {
        self.update_query(|q| q.tab = tab);
    }

    pub fn set_status(&mut self, status: Option<Status>) {
        self.update_query(|q| q.status = status);
    }

    pub fn set_priority(&mut self, priority: Option<Priority>) {
        self.update_query(|q| q.priority = priority);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn task(id: &str, minutes: i64, status: Status, assignees: &[&str]) -> Task {
        let at = Utc.with_ymd_and_hms(2025, 12, 1, 8, 0, 0).unwrap() + Duration::minutes(minutes);
        Task {
            id: id.to_string(),
            subject: format!("Subject {id}"),
            detail: String::new(),
            status,
            priority: Priority::Low,
            progress: if status.is_completed() { 100 } else { 0 },
            assigned_employees: assignees.iter().map(|s| s.to_string()).collect(),
            project_id: "PRJ-001".into(),
            created_by: "HR-1".into(),
            created_at: at,
            updated_at: at,
            completed_at: status.is_completed().then_some(at),
            expected_start_at: None,
            expected_end_at: None,
            history: Vec::new(),
        }
    }

    fn projects() -> Vec<Project> {
        vec![Project { id: "PRJ-001".into(), name: "Payroll Revamp".into() }]
    }

    fn population() -> Vec<Task> {
        vec![
            task("TASK-001", 0, Status::Open, &["E1"]),
            task("TASK-002", 1, Status::Completed, &["E2"]),
            task("TASK-003", 2, Status::Canceled, &["E1", "E2"]),
            task("TASK-004", 3, Status::Working, &["E2"]),
            task("TASK-005", 4, Status::Completed, &["E1"]),
        ]
    }

    fn hr() -> Viewer {
        Viewer { employee_id: "HR-1".into(), is_hr: true }
    }

    #[test]
    fn non_hr_sees_only_assigned_tasks() {
        let tasks = population();
        let me = Viewer { employee_id: "E1".into(), is_hr: false };
        let queries = [
            TaskQuery::default(),
            TaskQuery { tab: Tab::Open, ..Default::default() },
            TaskQuery { text: "subject".into(), ..Default::default() },
        ];
        for q in &queries {
            let seen = project_tasks(&tasks, &me, q, &projects());
            assert!(seen.iter().all(|t| t.is_assigned_to("E1")));
        }
        let all = project_tasks(&tasks, &me, &TaskQuery::default(), &projects());
        let ids: Vec<_> = all.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["TASK-005", "TASK-003", "TASK-001"]);
    }

    #[test]
    fn hr_open_tab_excludes_completed_and_canceled() {
        let tasks = population();
        let q = TaskQuery { tab: Tab::Open, ..Default::default() };
        let seen = project_tasks(&tasks, &hr(), &q, &projects());
        let ids: Vec<_> = seen.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["TASK-004", "TASK-001"]);
    }

    #[test]
    fn text_matches_project_name_and_assignees() {
        let tasks = population();
        let by_project = TaskQuery { text: "PAYROLL".into(), ..Default::default() };
        assert_eq!(project_tasks(&tasks, &hr(), &by_project, &projects()).len(), 5);

        let by_assignee = TaskQuery { text: "e2".into(), ..Default::default() };
        assert_eq!(project_tasks(&tasks, &hr(), &by_assignee, &projects()).len(), 3);

        let filtered = TaskQuery {
            status: Some(Status::Completed),
            priority: Some(Priority::Low),
            ..Default::default()
        };
        assert_eq!(project_tasks(&tasks, &hr(), &filtered, &projects()).len(), 2);
    }

    #[test]
    fn every_change_resets_the_window() {
        let mut view = TaskView::default();
        let edits: Vec<Box<dyn Fn(&mut TaskView)>> = vec![
            Box::new(|v: &mut TaskView| v.set_text("abc")),
            Box::new(|v: &mut TaskView| v.set_tab(Tab::Completed)),
            Box::new(|v: &mut TaskView| v.set_status(Some(Status::Review))),
            Box::new(|v: &mut TaskView| v.set_priority(Some(Priority::High))),
            Box::new(|v: &mut TaskView| v.toggle_mode()),
            Box::new(|v: &mut TaskView| v.set_page_size(12)),
        ];
        for edit in edits {
            view.set_mode(ModeKind::Pagination);
            view.goto_page(3, 100);
            assert_eq!(view.page(), 3);
            edit(&mut view);
            assert_eq!(view.page(), 1);

            view.set_mode(ModeKind::LoadMore);
            view.reveal_more(100);
            assert_eq!(view.visible_count(), 16);
            edit(&mut view);
            assert_eq!(view.page(), 1);
            assert_eq!(view.visible_count(), REVEAL_STEP);
        }
    }

    #[test]
    fn incremental_reveal_grows_to_total() {
        let items: Vec<u32> = (0..20).collect();
        let mut view: ViewState<TaskQuery> = ViewState::default();
        let page = view.slice(&items);
        assert_eq!((page.items.len(), page.has_more), (8, true));

        assert!(!view.near_end(3, items.len()));
        assert!(view.near_end(6, items.len()));
        assert_eq!(view.visible_count(), 16);
        view.reveal_more(items.len());
        assert_eq!(view.visible_count(), 20);
        let page = view.slice(&items);
        assert_eq!((page.items.len(), page.has_more), (20, false));
        assert!(!view.near_end(19, items.len()));
    }

    #[test]
    fn fixed_paging_slices_and_clamps() {
        let items: Vec<u32> = (0..17).collect();
        let mut view: TaskView = ViewState::new(ModeKind::Pagination, 8);
        assert_eq!(view.total_pages(items.len()), 3);
        assert_eq!(view.total_pages(0), 1);

        view.next_page(items.len());
        view.next_page(items.len());
        view.next_page(items.len());
        let page = view.slice(&items);
        assert_eq!(page.page, 3);
        assert_eq!(page.items, vec![16]);

        view.prev_page(items.len());
        assert_eq!(view.slice(&items).items, (8..16).collect::<Vec<_>>());
        view.goto_page(0, items.len());
        assert_eq!(view.page(), 1);
    }

    #[test]
    fn mode_kind_round_trips_through_storage_names() {
        assert_eq!("loadmore".parse::<ModeKind>(), Ok(ModeKind::LoadMore));
        assert_eq!(ModeKind::Pagination.to_string(), "pagination");
        assert!("pages!".parse::<ModeKind>().is_err());
    }
}
