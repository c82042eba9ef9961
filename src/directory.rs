//! Employee and project reference data.
//!
//! The directory is read-only seed data: it resolves display names, decides
//! who holds the HR role, and matches login credentials. A `directory.json`
//! in the data directory replaces the built-in seed.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{AuthError, Error, Result};

/// Designation id that grants the HR role unless configured otherwise.
pub const DEFAULT_HR_DESIGNATION: &str = "DES-004";

const SEED: &str = include_str!("../data/directory.json");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: String,
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub office_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub designation_id: String,
    #[serde(default)]
    pub department_id: String,
    #[serde(default)]
    pub company_id: String,
}

impl Employee {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
}

/// A logged-in employee, stripped of credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub employee: Employee,
    #[serde(rename = "isHR")]
    pub is_hr: bool,
}

impl Session {
    pub fn employee_id(&self) -> &str {
        &self.employee.id
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Directory {
    pub employees: Vec<Employee>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(skip)]
    hr_designation: Option<String>,
}

impl Directory {
    pub fn new(employees: Vec<Employee>, projects: Vec<Project>) -> Self {
        Directory {
            employees,
            projects,
            hr_designation: None,
        }
    }

    /// The built-in sample directory.
    pub fn seed() -> Self {
        // The seed is checked by the tests below.
        serde_json::from_str(SEED).unwrap_or_default()
    }

    /// Load `directory.json` from `dir`, falling back to the seed when absent.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join("directory.json");
        if !path.exists() {
            debug!("no directory.json, using seed directory");
            return Ok(Directory::seed());
        }
        let raw = std::fs::read_to_string(&path).map_err(|source| Error::Io {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| Error::Json {
            key: path.display().to_string(),
            source,
        })
    }

    pub fn with_hr_designation(mut self, designation_id: impl Into<String>) -> Self {
        self.hr_designation = Some(designation_id.into());
        self
    }

    fn hr_designation(&self) -> &str {
        self.hr_designation.as_deref().unwrap_or(DEFAULT_HR_DESIGNATION)
    }

    pub fn employee(&self, id: &str) -> Option<&Employee> {
        self.employees.iter().find(|e| e.id == id)
    }

    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn first_project(&self) -> Option<&Project> {
        self.projects.first()
    }

    pub fn is_hr(&self, employee: &Employee) -> bool {
        employee.designation_id == self.hr_designation()
    }

    /// "First Last" for a known employee, else the id itself, else a dash.
    pub fn resolve_employee_name(&self, id: &str) -> String {
        match self.employee(id) {
            Some(e) => {
                let name = e.display_name();
                if name.is_empty() { e.id.clone() } else { name }
            }
            None if !id.is_empty() => id.to_string(),
            None => "—".to_string(),
        }
    }

    pub fn resolve_project_name(&self, id: &str) -> String {
        match self.project(id) {
            Some(p) if !p.name.is_empty() => p.name.clone(),
            _ if !id.is_empty() => id.to_string(),
            _ => "—".to_string(),
        }
    }

    /// Match an office email (trimmed, case-insensitive) and exact password.
    pub fn authenticate(&self, email: &str, password: &str) -> std::result::Result<Session, AuthError> {
        let email = email.trim().to_lowercase();
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        let found = self.employees.iter().find(|e| {
            e.office_email.trim().to_lowercase() == email && e.password.as_deref() == Some(password)
        });
        let Some(found) = found else {
            warn!(email = %email, "login rejected");
            return Err(AuthError::InvalidCredentials);
        };

        let is_hr = self.is_hr(found);
        let mut employee = found.clone();
        employee.password = None;
        debug!(employee_id = %employee.id, is_hr, "login accepted");
        Ok(Session { employee, is_hr })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_parses_and_has_an_hr_employee() {
        let dir = Directory::seed();
        assert!(dir.employees.len() >= 3);
        assert!(!dir.projects.is_empty());
        assert!(dir.employees.iter().any(|e| dir.is_hr(e)));
    }

    #[test]
    fn authenticate_matches_email_loosely_and_password_exactly() {
        let dir = Directory::seed();
        let session = dir.authenticate("  Asha.Silva@Example.COM ", "asha-hr-2025").unwrap();
        assert!(session.is_hr);
        assert_eq!(session.employee.password, None);

        assert_eq!(
            dir.authenticate("asha.silva@example.com", "ASHA-HR-2025"),
            Err(AuthError::InvalidCredentials)
        );
        assert_eq!(dir.authenticate("", "x"), Err(AuthError::MissingCredentials));
        assert_eq!(dir.authenticate("a@b.c", ""), Err(AuthError::MissingCredentials));
    }

    #[test]
    fn names_fall_back_to_ids() {
        let dir = Directory::seed();
        assert_eq!(dir.resolve_employee_name("EMP-0001"), "Asha Silva");
        assert_eq!(dir.resolve_employee_name("EMP-9999"), "EMP-9999");
        assert_eq!(dir.resolve_employee_name(""), "—");
        assert_eq!(dir.resolve_project_name("PRJ-001"), "Payroll Revamp");
        assert_eq!(dir.resolve_project_name("PRJ-404"), "PRJ-404");
    }

    #[test]
    fn hr_designation_is_configurable() {
        let dir = Directory::seed().with_hr_designation("DES-001");
        let asha = dir.employee("EMP-0001").unwrap();
        assert!(!dir.is_hr(asha));
    }
}
