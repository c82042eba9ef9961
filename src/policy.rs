//! Who may change what.
//!
//! One definition of the rules, used by the portal service and by the CLI/TUI
//! when deciding which actions to offer.

use crate::task::Task;
use crate::view::Viewer;

/// HR may manage any task; others only the tasks they created.
pub fn can_manage(actor: &Viewer, task: &Task) -> bool {
    actor.is_hr || task.created_by == actor.employee_id
}

/// Completion can be toggled by managers and by anyone assigned to the task.
pub fn can_toggle(actor: &Viewer, task: &Task) -> bool {
    can_manage(actor, task) || task.is_assigned_to(&actor.employee_id)
}

/// HR may edit any employee record; others only their own.
pub fn can_edit_employee(actor: &Viewer, employee_id: &str) -> bool {
    actor.is_hr || actor.employee_id == employee_id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{Priority, Status};
    use chrono::Utc;

    fn task(created_by: &str, assignees: &[&str]) -> Task {
        let now = Utc::now();
        Task {
            id: "TASK-001".into(),
            subject: "Check".into(),
            detail: String::new(),
            status: Status::Open,
            priority: Priority::Low,
            progress: 0,
            assigned_employees: assignees.iter().map(|s| s.to_string()).collect(),
            project_id: String::new(),
            created_by: created_by.into(),
            created_at: now,
            updated_at: now,
            completed_at: None,
            expected_start_at: None,
            expected_end_at: None,
            history: Vec::new(),
        }
    }

    fn viewer(id: &str, is_hr: bool) -> Viewer {
        Viewer { employee_id: id.into(), is_hr }
    }

    #[test]
    fn creator_or_hr_manages() {
        let t = task("E1", &["E2"]);
        assert!(can_manage(&viewer("E1", false), &t));
        assert!(can_manage(&viewer("HR", true), &t));
        assert!(!can_manage(&viewer("E2", false), &t));
    }

    #[test]
    fn assignees_may_toggle_but_strangers_may_not() {
        let t = task("E1", &["E2"]);
        assert!(can_toggle(&viewer("E2", false), &t));
        assert!(!can_toggle(&viewer("E3", false), &t));
    }

    #[test]
    fn employee_records() {
        assert!(can_edit_employee(&viewer("E1", false), "E1"));
        assert!(!can_edit_employee(&viewer("E1", false), "E2"));
        assert!(can_edit_employee(&viewer("HR", true), "E2"));
    }
}
