//! Main application logic for the terminal user interface.
//!
//! `App` drives the task list over a borrowed [`Desk`]: it keeps a
//! [`TaskView`] for the query and paging window, renders the current page,
//! and turns key presses into portal calls. In load-more mode, moving the
//! cursor near the last revealed row reveals the next batch.

use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};

use hrdesk::fields::{Priority, Status};
use hrdesk::policy;
use hrdesk::task::Task;
use hrdesk::view::{TaskView, ViewMode};
use hrdesk::when::{format_local, format_relative};

use crate::cmd::Desk;
use crate::print::history_line;
use crate::tui::{
    colors::{priority_color, status_color, ACCENT, DARK_RED},
    enums::{AppState, InputMode},
    input::InputField,
    utils::centered_rect,
};

/// Main application state for the terminal user interface.
pub struct App<'a> {
    desk: &'a mut Desk,
    state: AppState,
    view: TaskView,
    task_list_state: TableState,
    /// Ids of the rows in the current window, in display order.
    rows: Vec<String>,
    total: usize,
    total_pages: usize,
    selected_task: Option<String>,
    search: InputField,
    input_mode: InputMode,
    status_message: String,
    confirm_action: Option<String>,
    detail_scroll: u16,
}

impl<'a> App<'a> {
    pub fn new(desk: &'a mut Desk) -> Result<Self> {
        let view = desk.task_view()?;
        let mut app = App {
            desk,
            state: AppState::TaskList,
            view,
            task_list_state: TableState::default(),
            rows: Vec::new(),
            total: 0,
            total_pages: 1,
            selected_task: None,
            search: InputField::new(),
            input_mode: InputMode::None,
            status_message: String::new(),
            confirm_action: None,
            detail_scroll: 0,
        };
        app.refresh()?;
        Ok(app)
    }

    /// Recompute the visible window, keeping the selection on the same task
    /// when it is still shown.
    fn refresh(&mut self) -> Result<()> {
        let old_selected = self
            .task_list_state
            .selected()
            .and_then(|i| self.rows.get(i))
            .cloned();

        let page = self.desk.task_page(&self.view)?;
        self.rows = page.items.iter().map(|t| t.id.clone()).collect();
        self.total = page.total;
        self.total_pages = page.total_pages;

        let restored = old_selected.and_then(|id| self.rows.iter().position(|r| *r == id));
        self.task_list_state.select(match restored {
            Some(i) => Some(i),
            None if self.rows.is_empty() => None,
            None => Some(0),
        });
        Ok(())
    }

    fn selected_id(&self) -> Option<String> {
        self.task_list_state
            .selected()
            .and_then(|i| self.rows.get(i))
            .cloned()
    }

    fn task(&self, id: &str) -> Option<&Task> {
        self.desk.task_store().get(id)
    }

    fn set_status_message(&mut self, msg: impl Into<String>) {
        self.status_message = msg.into();
    }

    fn save_view(&mut self) {
        if let Err(e) = self.desk.save_task_view(&self.view) {
            self.set_status_message(format!("Could not save view: {e}"));
        }
    }

    /// After a cursor move in load-more mode, reveal more rows when close to
    /// the end of the window.
    fn after_cursor_move(&mut self) -> Result<()> {
        if let Some(i) = self.task_list_state.selected() {
            if self.view.near_end(i, self.total) {
                let before = self.rows.len();
                self.refresh()?;
                self.set_status_message(format!("Loaded {} more", self.rows.len() - before));
            }
        }
        Ok(())
    }

    fn cycle_page_size(&mut self, forward: bool) {
        let options = &self.desk.config().page_size_options;
        if options.is_empty() {
            return;
        }
        let current = options.iter().position(|n| *n == self.view.page_size());
        let next = match (current, forward) {
            (Some(i), true) => (i + 1) % options.len(),
            (Some(i), false) => (i + options.len() - 1) % options.len(),
            (None, _) => 0,
        };
        let size = options[next];
        self.view.set_page_size(size);
        self.save_view();
        self.set_status_message(format!("Page size {size}"));
    }

    fn toggle_selected(&mut self) -> Result<()> {
        let Some(id) = self.selected_id() else {
            return Ok(());
        };
        match self.desk.toggle_task(&id) {
            Ok(task) => {
                let msg = if task.status.is_completed() {
                    format!("Completed {id}")
                } else {
                    format!("Reopened {id} ({}%)", task.progress)
                };
                self.set_status_message(msg);
            }
            Err(e) => self.set_status_message(e.to_string()),
        }
        self.refresh()
    }

    fn ask_delete(&mut self, id: String) {
        let viewer = match self.desk.viewer() {
            Ok(v) => v,
            Err(e) => return self.set_status_message(e.to_string()),
        };
        match self.task(&id).map(|task| policy::can_manage(&viewer, task)) {
            Some(true) => {
                self.confirm_action = Some(id);
                self.state = AppState::Confirm;
            }
            Some(false) => self.set_status_message("Only the creator or HR can delete this task"),
            None => {}
        }
    }

    fn delete_confirmed(&mut self) -> Result<()> {
        if let Some(id) = self.confirm_action.take() {
            match self.desk.delete_task(&id) {
                Ok(()) => self.set_status_message(format!("Deleted {id}")),
                Err(e) => self.set_status_message(e.to_string()),
            }
            if self.selected_task.as_deref() == Some(id.as_str()) {
                self.selected_task = None;
            }
        }
        self.refresh()
    }

    fn handle_search_input(&mut self, key: KeyCode) -> Result<()> {
        match key {
            KeyCode::Esc => {
                self.search.clear();
                self.input_mode = InputMode::None;
                self.view.set_text("");
            }
            KeyCode::Enter => {
                self.input_mode = InputMode::None;
                self.set_status_message(format!("{} matching tasks", self.total));
                return Ok(());
            }
            KeyCode::Backspace => {
                self.search.handle_backspace();
                self.view.set_text(self.search.value.clone());
            }
            KeyCode::Left => self.search.move_cursor_left(),
            KeyCode::Right => self.search.move_cursor_right(),
            KeyCode::Char(c) => {
                self.search.handle_char(c);
                self.view.set_text(self.search.value.clone());
            }
            _ => return Ok(()),
        }
        self.refresh()
    }

    /// Returns true when the app should quit.
    fn handle_task_list_input(&mut self, key: KeyCode, modifiers: KeyModifiers) -> Result<bool> {
        if self.input_mode == InputMode::Search {
            self.handle_search_input(key)?;
            return Ok(false);
        }

        match key {
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => return Ok(true),
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Esc => {
                if self.search.value.is_empty() {
                    return Ok(true);
                }
                self.search.clear();
                self.view.set_text("");
                self.refresh()?;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                if let Some(i) = self.task_list_state.selected() {
                    self.task_list_state.select(Some(i.saturating_sub(1)));
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                match self.task_list_state.selected() {
                    Some(i) if i + 1 < self.rows.len() => self.task_list_state.select(Some(i + 1)),
                    None if !self.rows.is_empty() => self.task_list_state.select(Some(0)),
                    _ => {}
                }
                self.after_cursor_move()?;
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                if let Some(id) = self.selected_id() {
                    self.selected_task = Some(id);
                    self.detail_scroll = 0;
                    self.state = AppState::TaskDetail;
                }
            }
            KeyCode::Char('/') => {
                self.input_mode = InputMode::Search;
            }
            KeyCode::Tab => {
                let tab = self.view.query().tab.cycle();
                self.view.set_tab(tab);
                self.set_status_message(format!("Tab: {}", tab.label()));
                self.refresh()?;
            }
            KeyCode::Char('s') => {
                let next = cycle_option(self.view.query().status, Status::all());
                self.view.set_status(next);
                self.refresh()?;
            }
            KeyCode::Char('p') => {
                let next = cycle_option(self.view.query().priority, Priority::all());
                self.view.set_priority(next);
                self.refresh()?;
            }
            KeyCode::Char('m') => {
                self.view.toggle_mode();
                self.save_view();
                self.refresh()?;
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                self.cycle_page_size(true);
                self.refresh()?;
            }
            KeyCode::Char('-') => {
                self.cycle_page_size(false);
                self.refresh()?;
            }
            KeyCode::Char('n') | KeyCode::Right => {
                match self.view.mode() {
                    ViewMode::IncrementalReveal { .. } => self.view.reveal_more(self.total),
                    ViewMode::FixedPaging { .. } => self.view.next_page(self.total),
                }
                self.refresh()?;
            }
            KeyCode::Char('N') | KeyCode::Left => {
                self.view.prev_page(self.total);
                self.refresh()?;
            }
            KeyCode::Char('c') => self.toggle_selected()?,
            KeyCode::Char('d') => {
                if let Some(id) = self.selected_id() {
                    self.ask_delete(id);
                }
            }
            KeyCode::Char('h') | KeyCode::Char('?') | KeyCode::F(1) => {
                self.state = AppState::Help;
            }
            _ => {}
        }
        Ok(false)
    }

    fn handle_detail_input(&mut self, key: KeyCode) -> Result<bool> {
        match key {
            KeyCode::Esc | KeyCode::Char('q') => {
                self.selected_task = None;
                self.state = AppState::TaskList;
                self.refresh()?;
            }
            KeyCode::Up | KeyCode::Char('k') => self.detail_scroll = self.detail_scroll.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => self.detail_scroll = self.detail_scroll.saturating_add(1),
            KeyCode::Char('c') => self.toggle_selected()?,
            KeyCode::Char('d') => {
                if let Some(id) = self.selected_task.clone() {
                    self.ask_delete(id);
                }
            }
            _ => {}
        }
        Ok(false)
    }

    fn handle_confirm_input(&mut self, key: KeyCode) -> Result<bool> {
        match key {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                self.delete_confirmed()?;
                self.state = self.state_before_confirm();
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.confirm_action = None;
                self.state = self.state_before_confirm();
            }
            _ => {}
        }
        Ok(false)
    }

    /// The detail screen stays open only while its task still exists.
    fn state_before_confirm(&self) -> AppState {
        match &self.selected_task {
            Some(id) if self.task(id).is_some() => AppState::TaskDetail,
            _ => AppState::TaskList,
        }
    }

    fn handle_input(&mut self) -> Result<bool> {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    return Ok(false);
                }
                self.status_message.clear();
                return match self.state {
                    AppState::TaskList => self.handle_task_list_input(key.code, key.modifiers),
                    AppState::TaskDetail => self.handle_detail_input(key.code),
                    AppState::Confirm => self.handle_confirm_input(key.code),
                    AppState::Help => {
                        self.state = AppState::TaskList;
                        Ok(false)
                    }
                };
            }
        }
        Ok(false)
    }

    fn filter_summary(&self) -> String {
        let q = self.view.query();
        let mut parts = vec![format!("Tab: {}", q.tab.label())];
        if let Some(s) = q.status {
            parts.push(format!("Status: {s}"));
        }
        if let Some(p) = q.priority {
            parts.push(format!("Priority: {p}"));
        }
        if !q.text.is_empty() {
            parts.push(format!("Search: '{}'", q.text));
        }
        parts.join("  ")
    }

    /// Render the task table with a header line.
    fn render_task_list(&mut self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(area);

        let (who, heading) = match self.desk.session() {
            Some(s) => (
                s.employee.display_name(),
                if s.is_hr { "ALL TASKS" } else { "MY TASKS" },
            ),
            None => (String::new(), "TASKS"),
        };
        let header_text = Line::from(vec![
            Span::styled(heading, Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(
                format!("{}  Logged in as {who}", self.filter_summary()),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
            ),
        ]);
        let header_block = Paragraph::new(header_text)
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center);
        f.render_widget(header_block, chunks[0]);

        let header = Row::new(
            ["ID", "Status", "Priority", "%", "Project", "Assignees", "Subject"]
                .iter()
                .map(|h| Cell::from(*h).style(Style::default().add_modifier(Modifier::BOLD))),
        )
        .style(Style::default().bg(ACCENT).fg(Color::White))
        .height(1);

        let directory = self.desk.directory();
        let store = self.desk.task_store();
        let rows: Vec<Row> = self
            .rows
            .iter()
            .filter_map(|id| store.get(id))
            .map(|t| {
                let assignees = t
                    .assigned_employees
                    .iter()
                    .map(|id| directory.resolve_employee_name(id))
                    .collect::<Vec<_>>()
                    .join(", ");
                let style = if t.status.is_completed() {
                    Style::default().fg(Color::DarkGray)
                } else {
                    Style::default().fg(Color::White)
                };
                Row::new(vec![
                    Cell::from(t.id.clone()),
                    Cell::from(t.status.as_str()).style(Style::default().fg(status_color(t.status))),
                    Cell::from(t.priority.as_str()).style(Style::default().fg(priority_color(t.priority))),
                    Cell::from(format!("{:>3}", t.progress)),
                    Cell::from(directory.resolve_project_name(&t.project_id)),
                    Cell::from(assignees),
                    Cell::from(t.subject.clone()),
                ])
                .style(style)
            })
            .collect();

        let widths = [
            Constraint::Length(10),
            Constraint::Length(12),
            Constraint::Length(9),
            Constraint::Length(4),
            Constraint::Length(18),
            Constraint::Length(20),
            Constraint::Min(20),
        ];

        let window = match self.view.mode() {
            ViewMode::IncrementalReveal { .. } => {
                format!("Showing {}/{} · auto load", self.rows.len(), self.total)
            }
            ViewMode::FixedPaging { page, page_size } => {
                format!("Page {page}/{} · {page_size} per page · {} total", self.total_pages, self.total)
            }
        };
        let table = Table::new(rows, widths)
            .header(header)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("Tasks ({window}) - Press 'h' for help")),
            )
            .row_highlight_style(Style::default().bg(Color::Gray).fg(Color::Black))
            .highlight_symbol(">> ");

        f.render_stateful_widget(table, chunks[1], &mut self.task_list_state);
    }

    fn render_task_detail(&mut self, f: &mut Frame, area: Rect) {
        let Some(task) = self.selected_task.as_deref().and_then(|id| self.task(id)) else {
            let p = Paragraph::new("Task no longer exists. Press Esc to return.")
                .block(Block::default().borders(Borders::ALL).title("Task"));
            f.render_widget(p, area);
            return;
        };
        let directory = self.desk.directory();
        let now = self.desk.now();
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let field = |label: &'static str, value: String| {
            Line::from(vec![Span::styled(format!("{label:<12}"), bold), Span::raw(value)])
        };

        let assignees = task
            .assigned_employees
            .iter()
            .map(|id| directory.resolve_employee_name(id))
            .collect::<Vec<_>>()
            .join(", ");
        let mut text = vec![
            field("ID:", task.id.clone()),
            field("Subject:", task.subject.clone()),
            Line::from(vec![
                Span::styled(format!("{:<12}", "Status:"), bold),
                Span::styled(task.status.as_str(), Style::default().fg(status_color(task.status))),
            ]),
            field("Priority:", task.priority.to_string()),
            field("Progress:", format!("{}%", task.progress)),
            field("Project:", directory.resolve_project_name(&task.project_id)),
            field("Assignees:", if assignees.is_empty() { "-".into() } else { assignees }),
            field("Created by:", directory.resolve_employee_name(&task.created_by)),
            field(
                "Created:",
                format!("{} ({})", format_local(Some(task.created_at)), format_relative(Some(task.created_at), now)),
            ),
            field(
                "Updated:",
                format!("{} ({})", format_local(Some(task.updated_at)), format_relative(Some(task.updated_at), now)),
            ),
            field("Completed:", format_local(task.completed_at)),
            field("Start:", format_local(task.expected_start_at)),
            field("End:", format_local(task.expected_end_at)),
            Line::from(""),
            Line::from(Span::styled("Detail", bold)),
            Line::from(if task.detail.is_empty() { "-".to_string() } else { task.detail.clone() }),
            Line::from(""),
            Line::from(Span::styled(format!("History ({})", task.history.len()), bold)),
        ];
        text.extend(task.history.iter().map(|e| Line::from(history_line(e, directory))));

        let paragraph = Paragraph::new(text)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Task Details - c toggle · d delete · Esc back"),
            )
            .wrap(Wrap { trim: false })
            .scroll((self.detail_scroll, 0));
        f.render_widget(paragraph, area);
    }

    fn render_help(&mut self, f: &mut Frame, area: Rect) {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let help_text = vec![
            Line::from(Span::styled("Task Desk Help", bold)),
            Line::from(""),
            Line::from(Span::styled("Task List:", bold)),
            Line::from("  ↑/↓, k/j     Move (auto-loads more near the end)"),
            Line::from("  Enter/Space  View task details and history"),
            Line::from("  /            Search"),
            Line::from("  Tab          Cycle tab (All → Open → Completed)"),
            Line::from("  s            Cycle status filter"),
            Line::from("  p            Cycle priority filter"),
            Line::from("  m            Switch auto load / pages"),
            Line::from("  +/-          Change page size"),
            Line::from("  n/→, N/←     Next (or load more) / previous page"),
            Line::from("  c            Toggle completed"),
            Line::from("  d            Delete task"),
            Line::from("  h/?/F1       Show this help"),
            Line::from("  q/Esc        Quit"),
            Line::from(""),
            Line::from(Span::styled("Task Detail:", bold)),
            Line::from("  ↑/↓          Scroll"),
            Line::from("  c, d         Toggle, delete"),
            Line::from("  Esc/q        Back to task list"),
        ];
        let paragraph = Paragraph::new(help_text)
            .block(Block::default().borders(Borders::ALL).title("Help - Press any key to return"))
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
    }

    fn render_confirm(&mut self, f: &mut Frame, area: Rect) {
        let block = Block::default()
            .title("Confirm Action")
            .borders(Borders::ALL)
            .style(Style::default().bg(DARK_RED));

        let area = centered_rect(50, 20, area);
        f.render_widget(Clear, area);

        let text = vec![
            Line::from(""),
            Line::from(Span::styled(
                format!("Delete task {}?", self.confirm_action.as_deref().unwrap_or("")),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from("This action cannot be undone."),
            Line::from(""),
            Line::from("Press 'y' to confirm, 'n' to cancel"),
        ];
        let paragraph = Paragraph::new(text)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
    }

    fn render_status_bar(&mut self, f: &mut Frame, area: Rect) {
        let unread = self.desk.unread_count().unwrap_or(0);
        let text = if !self.status_message.is_empty() {
            self.status_message.clone()
        } else if self.input_mode == InputMode::Search {
            format!("Search: {} (Esc to clear, Enter to confirm)", self.search.value)
        } else {
            match self.state {
                AppState::TaskList => format!(
                    "Tasks: {} | Unread notifications: {unread} | Press 'h' for help",
                    self.total
                ),
                AppState::TaskDetail => "Task Details".to_string(),
                AppState::Help => "Help".to_string(),
                AppState::Confirm => "Confirm Action".to_string(),
            }
        };
        let status = Paragraph::new(text)
            .style(Style::default().bg(ACCENT).fg(Color::White))
            .alignment(Alignment::Left);
        f.render_widget(status, area);
    }

    fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(f.area());

        match self.state {
            AppState::TaskList => self.render_task_list(f, chunks[0]),
            AppState::TaskDetail => self.render_task_detail(f, chunks[0]),
            AppState::Help => self.render_help(f, chunks[0]),
            AppState::Confirm => {
                match self.state_before_confirm() {
                    AppState::TaskDetail => self.render_task_detail(f, chunks[0]),
                    _ => self.render_task_list(f, chunks[0]),
                }
                self.render_confirm(f, chunks[0]);
            }
        }
        self.render_status_bar(f, chunks[1]);
    }

    /// Main event loop. Returns when the user quits.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;
            if self.handle_input()? {
                break;
            }
        }
        self.desk.save_task_view(&self.view)?;
        Ok(())
    }
}

/// Step a filter through `None → each value → None`.
fn cycle_option<T: Copy + PartialEq>(current: Option<T>, values: &[T]) -> Option<T> {
    match current {
        None => values.first().copied(),
        Some(v) => {
            let i = values.iter().position(|x| *x == v)?;
            values.get(i + 1).copied()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_cycle_through_none() {
        let all = Priority::all();
        let mut current = None;
        let mut seen = Vec::new();
        for _ in 0..4 {
            current = cycle_option(current, all);
            seen.push(current);
        }
        assert_eq!(
            seen,
            [Some(Priority::Low), Some(Priority::Medium), Some(Priority::High), None]
        );
    }
}
