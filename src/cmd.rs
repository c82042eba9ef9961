//! Command implementations for the CLI interface.
//!
//! Each handler takes the open [`Portal`], performs one operation through
//! it, and prints the outcome. Library errors are wrapped with `anyhow`
//! context and reported by `main`.

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::Subcommand;
use clap_complete::{generate, Shell};

use hrdesk::fields::{Priority, Status, Tab};
use hrdesk::notification::{NotificationQuery, NotificationTab, NotificationType};
use hrdesk::portal::{NotificationDraft, Portal};
use hrdesk::storage::FileStore;
use hrdesk::task::{TaskInput, TaskPatch};
use hrdesk::view::{ModeKind, ViewMode, ViewState};
use hrdesk::when::parse_when;

use crate::print::{print_notification, print_notification_table, print_page_footer, print_task, print_task_table};
use crate::tui::run::run_tui;

/// The portal as the binary uses it: file-backed.
pub type Desk = Portal<FileStore>;

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the interactive task list.
    Ui,

    /// Log in with an office email.
    Login {
        /// Office email address.
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Forget the stored session.
    Logout,

    /// Show the logged-in employee.
    Whoami,

    /// Create a task.
    Add {
        /// Short subject line.
        subject: String,
        /// Longer description.
        #[arg(long)]
        detail: Option<String>,
        #[arg(long, value_enum, default_value_t = Status::Open)]
        status: Status,
        #[arg(long, value_enum, default_value_t = Priority::Low)]
        priority: Priority,
        /// Initial progress, 0-100.
        #[arg(long, default_value_t = 0)]
        progress: u8,
        /// Project id (HR only; others use the first project).
        #[arg(long)]
        project: Option<String>,
        /// Assignee employee id (HR only). May be repeated.
        #[arg(long = "assign")]
        assignees: Vec<String>,
        /// Expected start: YYYY-MM-DD[THH:MM], "today", "tomorrow", "in Nd", "next friday".
        #[arg(long)]
        start: Option<String>,
        /// Expected end, same formats as --start.
        #[arg(long)]
        end: Option<String>,
        /// Explicit task id instead of the next TASK-NNN.
        #[arg(long)]
        id: Option<String>,
    },

    /// List visible tasks.
    List {
        /// Case-insensitive text search.
        #[arg(long, short)]
        query: Option<String>,
        #[arg(long, value_enum, default_value_t = Tab::All)]
        tab: Tab,
        #[arg(long, value_enum)]
        status: Option<Status>,
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        /// Paging mode; remembered for later listings.
        #[arg(long, value_enum)]
        mode: Option<ModeKind>,
        /// Page to show in pagination mode.
        #[arg(long)]
        page: Option<usize>,
        /// Page size; remembered for later listings.
        #[arg(long)]
        page_size: Option<usize>,
        /// Reveal this many extra batches in load-more mode.
        #[arg(long, default_value_t = 0)]
        more: usize,
    },

    /// Show one task.
    View {
        id: String,
        /// Include the audit history.
        #[arg(long)]
        history: bool,
    },

    /// Edit task fields.
    Update {
        id: String,
        #[arg(long)]
        subject: Option<String>,
        #[arg(long)]
        detail: Option<String>,
        #[arg(long, value_enum)]
        status: Option<Status>,
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        #[arg(long)]
        progress: Option<u8>,
        /// Project id (HR only).
        #[arg(long)]
        project: Option<String>,
        /// Replace assignees (HR only). May be repeated.
        #[arg(long = "assign")]
        assignees: Vec<String>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        /// Clear the expected start.
        #[arg(long, conflicts_with = "start")]
        clear_start: bool,
        /// Clear the expected end.
        #[arg(long, conflicts_with = "end")]
        clear_end: bool,
    },

    /// Report progress (100 completes the task).
    Progress {
        id: String,
        value: u8,
    },

    /// Move a task to another status.
    Status {
        id: String,
        #[arg(value_enum)]
        status: Status,
    },

    /// Flip a task between completed and working.
    Toggle { id: String },

    /// Delete a task.
    Delete { id: String },

    /// List projects with task counts.
    Projects,

    /// Work with your notifications.
    Notif {
        #[command(subcommand)]
        action: NotifAction,
    },

    /// Generate shell completion scripts.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum NotifAction {
    /// List your notifications, newest first.
    List {
        #[arg(long, short)]
        query: Option<String>,
        /// Only unread notifications.
        #[arg(long)]
        unread: bool,
        #[arg(long, value_enum)]
        mode: Option<ModeKind>,
        #[arg(long)]
        page: Option<usize>,
        #[arg(long)]
        page_size: Option<usize>,
        #[arg(long, default_value_t = 0)]
        more: usize,
    },
    /// Mark read and show a notification.
    Open { id: String },
    /// Mark a notification unread.
    Unopen { id: String },
    /// Mark all of your notifications read.
    ReadAll {
        /// Mark them unread instead.
        #[arg(long)]
        unread: bool,
    },
    /// Delete one notification.
    Delete { id: String },
    /// Delete all of your notifications.
    Clear,
    /// Send a notification (HR may notify anyone).
    Add {
        /// Recipient employee id.
        #[arg(long)]
        to: String,
        title: String,
        #[arg(long)]
        message: Option<String>,
        #[arg(long, value_enum, default_value_t = NotificationType::Other)]
        kind: NotificationType,
        /// Where opening the notification should lead.
        #[arg(long)]
        link: Option<String>,
    },
}

/// Launch the terminal user interface.
pub fn cmd_ui(desk: &mut Desk) -> Result<()> {
    desk.require_session()?;
    run_tui(desk).context("UI error")
}

pub fn cmd_login(desk: &mut Desk, email: &str, password: &str) -> Result<()> {
    let session = desk.login(email, password)?;
    println!(
        "Logged in as {} ({}){}",
        session.employee.display_name(),
        session.employee.id,
        if session.is_hr { " [HR]" } else { "" }
    );
    Ok(())
}

pub fn cmd_logout(desk: &mut Desk) -> Result<()> {
    desk.logout()?;
    println!("Logged out.");
    Ok(())
}

pub fn cmd_whoami(desk: &Desk) -> Result<()> {
    let session = desk.require_session()?;
    let e = &session.employee;
    println!("ID:           {}", e.id);
    println!("Name:         {}", e.display_name());
    println!("Email:        {}", e.office_email);
    println!("Designation:  {}", e.designation_id);
    println!("Role:         {}", if session.is_hr { "HR" } else { "Employee" });
    println!("Unread:       {}", desk.unread_count()?);
    Ok(())
}

fn parse_date_arg(flag: &str, value: Option<&str>) -> Result<Option<chrono::DateTime<chrono::Utc>>> {
    let Some(value) = value else {
        return Ok(None);
    };
    match parse_when(value, Local::now().date_naive()) {
        Some(at) => Ok(Some(at)),
        None => bail!("could not understand {flag} '{value}'"),
    }
}

#[allow(clippy::too_many_arguments)]
pub fn cmd_add(
    desk: &mut Desk,
    subject: String,
    detail: Option<String>,
    status: Status,
    priority: Priority,
    progress: u8,
    project: Option<String>,
    assignees: Vec<String>,
    start: Option<String>,
    end: Option<String>,
    id: Option<String>,
) -> Result<()> {
    let input = TaskInput {
        id,
        subject,
        detail: detail.unwrap_or_default(),
        status,
        priority,
        progress,
        project_id: project.unwrap_or_default(),
        assigned_employees: split_ids(&assignees),
        expected_start_at: parse_date_arg("--start", start.as_deref())?,
        expected_end_at: parse_date_arg("--end", end.as_deref())?,
    };
    let task = desk.create_task(input)?;
    println!("Created {}: {}", task.id, task.subject);
    Ok(())
}

/// Accept both repeated flags and comma-separated lists.
fn split_ids(values: &[String]) -> Vec<String> {
    values
        .iter()
        .flat_map(|v| v.split(','))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Apply mode/size overrides and window movement shared by both listings.
/// Returns whether a remembered preference changed.
fn adjust_view<Q>(
    view: &mut ViewState<Q>,
    total: usize,
    mode: Option<ModeKind>,
    page: Option<usize>,
    page_size: Option<usize>,
    more: usize,
) -> bool {
    let mut changed = false;
    if let Some(kind) = mode {
        changed |= view.mode().kind() != kind;
        view.set_mode(kind);
    }
    if let Some(size) = page_size.filter(|n| *n > 0) {
        changed |= view.page_size() != size;
        view.set_page_size(size);
    }
    match view.mode() {
        ViewMode::IncrementalReveal { .. } => {
            for _ in 0..more {
                view.reveal_more(total);
            }
        }
        ViewMode::FixedPaging { .. } => {
            if let Some(p) = page {
                view.goto_page(p, total);
            }
        }
    }
    changed
}

#[allow(clippy::too_many_arguments)]
pub fn cmd_list(
    desk: &mut Desk,
    query: Option<String>,
    tab: Tab,
    status: Option<Status>,
    priority: Option<Priority>,
    mode: Option<ModeKind>,
    page: Option<usize>,
    page_size: Option<usize>,
    more: usize,
) -> Result<()> {
    let mut view = desk.task_view()?;
    view.set_text(query.unwrap_or_default());
    view.set_tab(tab);
    view.set_status(status);
    view.set_priority(priority);

    let total = desk.visible_tasks(view.query())?.len();
    if adjust_view(&mut view, total, mode, page, page_size, more) {
        desk.save_task_view(&view)?;
    }

    let page = desk.task_page(&view)?;
    let heading = if desk.viewer()?.is_hr { "All Tasks" } else { "My Tasks" };
    println!("{heading} ({} {})", page.total, if page.total == 1 { "task" } else { "tasks" });
    if page.items.is_empty() {
        println!("No tasks in this view.");
        return Ok(());
    }
    print_task_table(&page.items, desk.directory());
    print_page_footer(&view, &page);
    Ok(())
}

pub fn cmd_view(desk: &Desk, id: &str, history: bool) -> Result<()> {
    let task = desk.task(id)?;
    print_task(task, desk.directory(), desk.now(), history);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn cmd_update(
    desk: &mut Desk,
    id: &str,
    subject: Option<String>,
    detail: Option<String>,
    status: Option<Status>,
    priority: Option<Priority>,
    progress: Option<u8>,
    project: Option<String>,
    assignees: Vec<String>,
    start: Option<String>,
    end: Option<String>,
    clear_start: bool,
    clear_end: bool,
) -> Result<()> {
    let start = parse_date_arg("--start", start.as_deref())?;
    let end = parse_date_arg("--end", end.as_deref())?;
    let assignees = split_ids(&assignees);
    let patch = TaskPatch {
        subject,
        detail,
        status,
        priority,
        progress,
        project_id: project,
        assigned_employees: (!assignees.is_empty()).then_some(assignees),
        expected_start_at: if clear_start { Some(None) } else { start.map(Some) },
        expected_end_at: if clear_end { Some(None) } else { end.map(Some) },
        ..Default::default()
    };
    let task = desk.edit_task(id, patch)?;
    println!("Updated {} ({}, {}%)", task.id, task.status, task.progress);
    Ok(())
}

pub fn cmd_progress(desk: &mut Desk, id: &str, value: u8) -> Result<()> {
    let task = desk.set_progress(id, value)?;
    println!("{} is at {}% ({})", task.id, task.progress, task.status);
    Ok(())
}

pub fn cmd_status(desk: &mut Desk, id: &str, status: Status) -> Result<()> {
    let task = desk.set_status(id, status)?;
    println!("{} is now {} ({}%)", task.id, task.status, task.progress);
    Ok(())
}

pub fn cmd_toggle(desk: &mut Desk, id: &str) -> Result<()> {
    let task = desk.toggle_task(id)?;
    if task.status.is_completed() {
        println!("Completed {}.", task.id);
    } else {
        println!("Reopened {} as {} ({}%).", task.id, task.status, task.progress);
    }
    Ok(())
}

pub fn cmd_delete(desk: &mut Desk, id: &str) -> Result<()> {
    desk.delete_task(id)?;
    println!("Deleted {id}.");
    Ok(())
}

/// List projects with the number of visible tasks in each.
pub fn cmd_projects(desk: &Desk) -> Result<()> {
    let visible = desk.visible_tasks(&Default::default())?;
    println!("{:<10} {:<24} {}", "ID", "Project", "Tasks");
    for p in &desk.directory().projects {
        let count = visible.iter().filter(|t| t.project_id == p.id).count();
        println!("{:<10} {:<24} {}", p.id, hrdesk::when::truncate(&p.name, 24), count);
    }
    Ok(())
}

pub fn cmd_notif(desk: &mut Desk, action: NotifAction) -> Result<()> {
    match action {
        NotifAction::List { query, unread, mode, page, page_size, more } => {
            let mut view = desk.notification_view()?;
            view.set_text(query.unwrap_or_default());
            view.set_tab(if unread { NotificationTab::Unread } else { NotificationTab::All });

            let total = desk.notifications(view.query())?.len();
            if adjust_view(&mut view, total, mode, page, page_size, more) {
                desk.save_notification_view(&view)?;
            }
            let page = desk.notification_page(&view)?;
            println!("Notifications ({} unread)", desk.unread_count()?);
            if page.items.is_empty() {
                println!("Nothing here.");
                return Ok(());
            }
            print_notification_table(&page.items, desk.now());
            print_page_footer(&view, &page);
        }
        NotifAction::Open { id } => {
            let n = desk.open_notification(&id)?.clone();
            print_notification(&n, desk.now());
        }
        NotifAction::Unopen { id } => {
            desk.set_notification_opened(&id, false)?;
            println!("Marked {id} unread.");
        }
        NotifAction::ReadAll { unread } => {
            let n = desk.mark_all_notifications(!unread)?;
            println!("Marked {n} notification(s) {}.", if unread { "unread" } else { "read" });
        }
        NotifAction::Delete { id } => {
            desk.delete_notification(&id)?;
            println!("Deleted {id}.");
        }
        NotifAction::Clear => {
            let n = desk.clear_notifications()?;
            println!("Removed {n} notification(s).");
        }
        NotifAction::Add { to, title, message, kind, link } => {
            let sent = desk.notify(NotificationDraft {
                user_id: to,
                kind,
                title,
                message: message.unwrap_or_default(),
                redirect_path: link,
            })?;
            println!("Sent {} to {}.", sent.id, sent.user_id);
        }
    }
    Ok(())
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use crate::cli::Cli;
    use clap::CommandFactory;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_split_on_commas_and_repeats() {
        let ids = split_ids(&["EMP-0002, EMP-0003".into(), "EMP-0004".into(), " ".into()]);
        assert_eq!(ids, ["EMP-0002", "EMP-0003", "EMP-0004"]);
    }

    #[test]
    fn view_overrides_report_preference_changes() {
        let mut view: ViewState<NotificationQuery> = ViewState::default();
        assert!(!adjust_view(&mut view, 30, None, None, None, 2));
        assert_eq!(view.visible_count(), 24);

        assert!(adjust_view(&mut view, 30, Some(ModeKind::Pagination), Some(3), Some(10), 0));
        assert_eq!(view.page(), 3);
        assert!(!adjust_view(&mut view, 30, Some(ModeKind::Pagination), None, Some(10), 0));
    }

    #[test]
    fn bad_dates_are_rejected() {
        assert!(parse_date_arg("--end", Some("whenever")).is_err());
        assert!(parse_date_arg("--end", None).unwrap().is_none());
        assert!(parse_date_arg("--end", Some("2026-01-15")).unwrap().is_some());
    }
}
