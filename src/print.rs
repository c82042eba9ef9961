//! Plain-text rendering for CLI output.

use chrono::{DateTime, Utc};

use hrdesk::directory::Directory;
use hrdesk::notification::Notification;
use hrdesk::task::{AuditEntry, Task};
use hrdesk::view::{Page, ViewMode, ViewState};
use hrdesk::when::{format_local, format_relative, truncate};

/// Print tasks as a fixed-width table.
pub fn print_task_table(tasks: &[&Task], directory: &Directory) {
    println!(
        "{:<10} {:<12} {:<7} {:>4}  {:<16} {:<18} {}",
        "ID", "Status", "Pri", "%", "Project", "Assignees", "Subject"
    );
    for t in tasks {
        let assignees = t
            .assigned_employees
            .iter()
            .map(|id| directory.resolve_employee_name(id))
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "{:<10} {:<12} {:<7} {:>4}  {:<16} {:<18} {}",
            t.id,
            t.status.as_str(),
            t.priority.as_str(),
            t.progress,
            truncate(&directory.resolve_project_name(&t.project_id), 16),
            truncate(if assignees.is_empty() { "-" } else { assignees.as_str() }, 18),
            t.subject
        );
    }
}

/// "Showing 8 of 20" or "Page 2/3", with a hint for the next step.
pub fn print_page_footer<Q, T>(view: &ViewState<Q>, page: &Page<T>) {
    match view.mode() {
        ViewMode::IncrementalReveal { .. } => {
            let hint = if page.has_more { " (use --more to load more)" } else { "" };
            println!("\nShowing {} of {}{hint}", page.items.len(), page.total);
        }
        ViewMode::FixedPaging { page_size, .. } => {
            println!(
                "\nPage {}/{} · {} per page · {} total",
                page.page, page.total_pages, page_size, page.total
            );
        }
    }
}

/// Print one task in detail.
pub fn print_task(task: &Task, directory: &Directory, now: DateTime<Utc>, history: bool) {
    let assignees = task
        .assigned_employees
        .iter()
        .map(|id| format!("{} ({id})", directory.resolve_employee_name(id)))
        .collect::<Vec<_>>();
    println!("ID:           {}", task.id);
    println!("Subject:      {}", task.subject);
    println!("Status:       {}", task.status);
    println!("Priority:     {}", task.priority);
    println!("Progress:     {}%", task.progress);
    println!("Project:      {}", directory.resolve_project_name(&task.project_id));
    println!("Assignees:    {}", if assignees.is_empty() { "-".into() } else { assignees.join(", ") });
    println!("Created by:   {}", directory.resolve_employee_name(&task.created_by));
    println!("Created:      {} ({})", format_local(Some(task.created_at)), format_relative(Some(task.created_at), now));
    println!("Updated:      {} ({})", format_local(Some(task.updated_at)), format_relative(Some(task.updated_at), now));
    if let Some(by) = task.updated_by() {
        println!("Updated by:   {}", directory.resolve_employee_name(by));
    }
    println!("Completed:    {}", format_local(task.completed_at));
    println!("Start:        {}", format_local(task.expected_start_at));
    println!("End:          {}", format_local(task.expected_end_at));
    println!("Detail:\n{}\n", if task.detail.is_empty() { "-" } else { task.detail.as_str() });

    if history {
        println!("History ({}):", task.history.len());
        for entry in &task.history {
            println!("  {}", history_line(entry, directory));
        }
    }
}

/// One line per audit entry: when, who, what, and the changed fields.
pub fn history_line(entry: &AuditEntry, directory: &Directory) -> String {
    let mut line = format!(
        "{}  {:<16} {:<16} {}",
        format_local(Some(entry.at)),
        truncate(&directory.resolve_employee_name(&entry.by), 16),
        entry.action.as_str(),
        entry.summary
    );
    if let Some(changes) = &entry.changes {
        let parts: Vec<String> = changes
            .iter()
            .map(|(field, c)| format!("{field}: {} -> {}", c.from, c.to))
            .collect();
        if !parts.is_empty() {
            line.push_str(&format!(" [{}]", parts.join("; ")));
        }
    }
    line
}

pub fn print_notification_table(items: &[&Notification], now: DateTime<Utc>) {
    println!("{:<2} {:<22} {:<11} {:<14} {:<16} {}", "", "ID", "Type", "When", "From", "Title");
    for n in items {
        println!(
            "{:<2} {:<22} {:<11} {:<14} {:<16} {}",
            if n.opened { "" } else { "*" },
            truncate(&n.id, 22),
            n.kind.as_str(),
            format_relative(Some(n.created_at), now),
            truncate(&n.sender_name, 16),
            n.title
        );
    }
}

pub fn print_notification(n: &Notification, now: DateTime<Utc>) {
    println!("ID:       {}", n.id);
    println!("Type:     {}", n.kind);
    println!("From:     {}", if n.sender_name.is_empty() { "-" } else { n.sender_name.as_str() });
    println!("When:     {} ({})", format_local(Some(n.created_at)), format_relative(Some(n.created_at), now));
    println!("Title:    {}", n.title);
    if let Some(path) = &n.redirect_path {
        println!("Link:     {path}");
    }
    println!("\n{}", if n.message.is_empty() { "-" } else { n.message.as_str() });
}
