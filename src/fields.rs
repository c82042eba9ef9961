//! Enumerations and field types for tasks and their views.
//!
//! This module defines the structured values a task carries (status, priority)
//! and the audit actions recorded against it, plus the coarse tab filter the
//! task list offers.

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::ParseEnumError;

/// Task lifecycle status.
///
/// Transitions are unconstrained: any status may move to any other. The only
/// coupling is with `progress` (completed iff progress is 100).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Open,
    Working,
    Pending,
    Review,
    Overdue,
    Completed,
    Canceled,
    Transferred,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Open => "open",
            Status::Working => "working",
            Status::Pending => "pending",
            Status::Review => "review",
            Status::Overdue => "overdue",
            Status::Completed => "completed",
            Status::Canceled => "canceled",
            Status::Transferred => "transferred",
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Status::Completed)
    }

    /// Whether the task belongs under the "open" tab (not completed, not canceled).
    pub fn is_open_tab(&self) -> bool {
        !matches!(self, Status::Completed | Status::Canceled)
    }

    pub fn all() -> &'static [Status] {
        &[
            Status::Open,
            Status::Working,
            Status::Pending,
            Status::Review,
            Status::Overdue,
            Status::Completed,
            Status::Canceled,
            Status::Transferred,
        ]
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Status::all()
            .iter()
            .copied()
            .find(|st| st.as_str() == wanted)
            .ok_or_else(|| ParseEnumError {
                kind: "status",
                value: s.to_string(),
            })
    }
}

/// Task priority. Serialized capitalised, as stored by the portal.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
pub enum Priority {
    #[default]
    #[serde(alias = "low")]
    Low,
    #[serde(alias = "medium")]
    Medium,
    #[serde(alias = "high")]
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }

    pub fn all() -> &'static [Priority] {
        &[Priority::Low, Priority::Medium, Priority::High]
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            _ => Err(ParseEnumError {
                kind: "priority",
                value: s.to_string(),
            }),
        }
    }
}

/// Kind of change an audit entry records.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Created,
    ProgressUpdated,
    StatusChanged,
    Edited,
    Completed,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Created => "created",
            AuditAction::ProgressUpdated => "progress_updated",
            AuditAction::StatusChanged => "status_changed",
            AuditAction::Edited => "edited",
            AuditAction::Completed => "completed",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse tab filter over the task list.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    #[default]
    All,
    Open,
    Completed,
}

impl Tab {
    pub fn admits(&self, status: Status) -> bool {
        match self {
            Tab::All => true,
            Tab::Open => status.is_open_tab(),
            Tab::Completed => status.is_completed(),
        }
    }

    /// Next tab in display order, wrapping around.
    pub fn cycle(&self) -> Tab {
        match self {
            Tab::All => Tab::Open,
            Tab::Open => Tab::Completed,
            Tab::Completed => Tab::All,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tab::All => "All",
            Tab::Open => "Open",
            Tab::Completed => "Completed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("Completed".parse::<Status>(), Ok(Status::Completed));
        assert_eq!(" working ".parse::<Status>(), Ok(Status::Working));
        assert!("done".parse::<Status>().is_err());
    }

    #[test]
    fn open_tab_excludes_completed_and_canceled() {
        let open: Vec<_> = Status::all().iter().filter(|s| s.is_open_tab()).collect();
        assert_eq!(open.len(), 6);
        assert!(!Tab::Open.admits(Status::Canceled));
        assert!(!Tab::Open.admits(Status::Completed));
        assert!(Tab::Open.admits(Status::Overdue));
        assert!(Tab::Completed.admits(Status::Completed));
    }

    #[test]
    fn serde_names_match_stored_snapshots() {
        assert_eq!(serde_json::to_string(&Status::Canceled).unwrap(), "\"canceled\"");
        assert_eq!(serde_json::to_string(&Priority::High).unwrap(), "\"High\"");
        assert_eq!(
            serde_json::to_string(&AuditAction::ProgressUpdated).unwrap(),
            "\"progress_updated\""
        );
        let p: Priority = serde_json::from_str("\"medium\"").unwrap();
        assert_eq!(p, Priority::Medium);
    }
}
