//! Per-user notifications with read/unread state.
//!
//! `NotificationStore` mirrors the task store's shape: an ordered collection
//! with silent no-ops on unknown ids. Views over it reuse
//! [`crate::view::ViewState`] for paging.

use std::fmt;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::view::ViewState;

/// Category of a notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    Task,
    Leave,
    Payroll,
    Attendance,
    Shift,
    Todo,
    #[default]
    #[serde(other)]
    Other,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::Task => "task",
            NotificationType::Leave => "leave",
            NotificationType::Payroll => "payroll",
            NotificationType::Attendance => "attendance",
            NotificationType::Shift => "shift",
            NotificationType::Todo => "todo",
            NotificationType::Other => "other",
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type", default)]
    pub kind: NotificationType,
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub sender_name: String,
    #[serde(default)]
    pub redirect_path: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub opened: bool,
}

#[derive(Debug, Clone, Default)]
pub struct NotificationStore {
    items: Vec<Notification>,
}

impl NotificationStore {
    pub fn new(items: Vec<Notification>) -> Self {
        NotificationStore { items }
    }

    pub fn all(&self) -> &[Notification] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&Notification> {
        self.items.iter().find(|n| n.id == id)
    }

    /// Prepend a notification. Ignored when the id is empty or taken.
    pub fn add(&mut self, notification: Notification) -> bool {
        if notification.id.trim().is_empty() || self.get(&notification.id).is_some() {
            debug!(id = %notification.id, "notification add ignored");
            return false;
        }
        self.items.insert(0, notification);
        true
    }

    /// A user's notifications, newest first.
    pub fn for_user(&self, user_id: &str) -> Vec<&Notification> {
        let mut out: Vec<&Notification> = self.items.iter().filter(|n| n.user_id == user_id).collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        out
    }

    pub fn unread_count(&self, user_id: &str) -> usize {
        self.items
            .iter()
            .filter(|n| n.user_id == user_id && !n.opened)
            .count()
    }

    pub fn mark_opened(&mut self, id: &str, opened: bool) -> bool {
        match self.items.iter_mut().find(|n| n.id == id) {
            Some(n) => {
                n.opened = opened;
                true
            }
            None => false,
        }
    }

    /// Returns how many notifications were touched.
    pub fn mark_all_opened(&mut self, user_id: &str, opened: bool) -> usize {
        let mut touched = 0;
        for n in self.items.iter_mut().filter(|n| n.user_id == user_id) {
            n.opened = opened;
            touched += 1;
        }
        touched
    }

    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|n| n.id != id);
        before != self.items.len()
    }

    /// Remove every notification of `user_id`; returns how many went.
    pub fn clear_for_user(&mut self, user_id: &str) -> usize {
        let before = self.items.len();
        self.items.retain(|n| n.user_id != user_id);
        before - self.items.len()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NotificationTab {
    #[default]
    All,
    Unread,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationQuery {
    pub text: String,
    pub tab: NotificationTab,
}

/// Filter a user's notifications (already newest first) by tab and text.
pub fn project_notifications<'a>(
    items: Vec<&'a Notification>,
    query: &NotificationQuery,
) -> Vec<&'a Notification> {
    let needle = query.text.trim().to_lowercase();
    items
        .into_iter()
        .filter(|n| query.tab == NotificationTab::All || !n.opened)
        .filter(|n| {
            if needle.is_empty() {
                return true;
            }
            let hay = [
                n.title.as_str(),
                n.message.as_str(),
                n.sender_name.as_str(),
                n.kind.as_str(),
                n.redirect_path.as_deref().unwrap_or(""),
            ]
            .join(" ")
            .to_lowercase();
            hay.contains(&needle)
        })
        .collect()
}

/// Notification list view state.
pub type NotificationView = ViewState<NotificationQuery>;

impl ViewState<NotificationQuery> {
    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.update_query(|q| q.text = text);
    }

    pub fn set_tab(&mut self, tab: NotificationTab) {
        self.update_query(|q| q.tab = tab);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn note(id: &str, user: &str, minutes: i64, opened: bool) -> Notification {
        Notification {
            id: id.into(),
            user_id: user.into(),
            kind: NotificationType::Task,
            title: format!("Title {id}"),
            message: "Task assigned to you".into(),
            sender_name: "Asha Silva".into(),
            redirect_path: Some("/tasks".into()),
            created_at: Utc.with_ymd_and_hms(2025, 12, 1, 8, 0, 0).unwrap() + Duration::minutes(minutes),
            opened,
        }
    }

    fn store() -> NotificationStore {
        NotificationStore::new(vec![
            note("N1", "E1", 0, false),
            note("N2", "E2", 1, false),
            note("N3", "E1", 2, true),
            note("N4", "E1", 3, false),
        ])
    }

    #[test]
    fn user_scope_sorts_newest_first_and_counts_unread() {
        let s = store();
        let ids: Vec<_> = s.for_user("E1").iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, ["N4", "N3", "N1"]);
        assert_eq!(s.unread_count("E1"), 2);
        assert_eq!(s.unread_count("E9"), 0);
    }

    #[test]
    fn add_rejects_empty_and_duplicate_ids() {
        let mut s = store();
        assert!(!s.add(note("", "E1", 9, false)));
        assert!(!s.add(note("N1", "E1", 9, false)));
        assert!(s.add(note("N5", "E1", 9, false)));
        assert_eq!(s.all()[0].id, "N5");
    }

    #[test]
    fn read_state_and_removal_are_user_scoped() {
        let mut s = store();
        assert!(s.mark_opened("N1", true));
        assert!(!s.mark_opened("N9", true));
        assert_eq!(s.mark_all_opened("E1", true), 3);
        assert_eq!(s.unread_count("E1"), 0);
        assert_eq!(s.unread_count("E2"), 1);

        assert_eq!(s.clear_for_user("E1"), 3);
        assert!(s.delete("N2"));
        assert!(s.all().is_empty());
    }

    #[test]
    fn query_filters_unread_and_text() {
        let s = store();
        let unread = NotificationQuery { tab: NotificationTab::Unread, ..Default::default() };
        assert_eq!(project_notifications(s.for_user("E1"), &unread).len(), 2);

        let text = NotificationQuery { text: "title n3".into(), ..Default::default() };
        let hits = project_notifications(s.for_user("E1"), &text);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "N3");
    }

    #[test]
    fn unknown_type_maps_to_other() {
        let raw = r#"{"id":"N1","userId":"E1","type":"birthday","title":"Cake",
            "createdAt":"2025-12-01T08:00:00Z"}"#;
        let n: Notification = serde_json::from_str(raw).unwrap();
        assert_eq!(n.kind, NotificationType::Other);
        assert!(!n.opened);
    }

    #[test]
    fn view_resets_on_tab_change() {
        let mut view = NotificationView::default();
        view.reveal_more(40);
        view.set_tab(NotificationTab::Unread);
        assert_eq!(view.visible_count(), 8);
    }
}
