//! # hrdesk
//!
//! Task and notification engine of a small HR portal.
//!
//! The library keeps an ordered collection of tasks whose `status` and
//! `progress` are coupled (a task is completed exactly when its progress is
//! 100), records an append-only audit history for every change, and serves
//! role-scoped, filtered and paginated views of the collection. Per-user
//! notifications share the same paging machinery.
//!
//! ## Layout
//!
//! - [`store`]: the task collection and its mutation primitives
//! - [`history`]: audit entry construction and diffing
//! - [`view`]: filtering, sorting and the two paging strategies
//! - [`notification`]: per-user notifications with read state
//! - [`directory`] / [`policy`]: employees, projects, login, permissions
//! - [`storage`]: versioned key/value persistence
//! - [`portal`]: the service that wires everything for a logged-in user
//!
//! ## Example
//!
//! ```no_run
//! use hrdesk::{config::Config, directory::Directory, portal::Portal, storage::MemoryStore};
//! use hrdesk::task::TaskInput;
//!
//! let mut portal = Portal::init(MemoryStore::new(), Config::default(), Directory::seed())?;
//! portal.login("ravi.fernando@example.com", "ravi-sales-2025")?;
//! let task = portal.create_task(TaskInput { subject: "Call supplier".into(), ..Default::default() })?;
//! assert_eq!(task.id, "TASK-001");
//! # Ok::<(), hrdesk::Error>(())
//! ```

pub mod config;
pub mod directory;
pub mod error;
pub mod fields;
pub mod history;
pub mod notification;
pub mod policy;
pub mod portal;
pub mod storage;
pub mod store;
pub mod task;
pub mod view;
pub mod when;

pub use error::{Error, Result};
