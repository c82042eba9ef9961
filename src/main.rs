//! # hrd
//!
//! Command-line and terminal front end for the HR portal's task desk.
//!
//! ## Overview
//!
//! `hrd` keeps tasks and notifications in a data directory (`~/.hrdesk` by
//! default) and lets an employee log in with their office email, create and
//! track tasks, and read notifications. HR staff see and manage every task;
//! everyone else sees the tasks assigned to them.
//!
//! ## Usage
//!
//! ```text
//! hrd login asha.silva@example.com --password ...
//! hrd add "Prepare payroll run" --priority high --end "next friday"
//! hrd list --tab open --mode pagination --page-size 10
//! hrd progress TASK-001 60
//! hrd toggle TASK-001
//! hrd view TASK-001 --history
//! hrd notif list --unread
//! hrd ui
//! ```
//!
//! Logging goes to stderr and is controlled by `HRDESK_LOG`
//! (e.g. `HRDESK_LOG=hrdesk=debug`).

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use hrdesk::config::{self, Config};
use hrdesk::directory::Directory;
use hrdesk::portal::Portal;
use hrdesk::storage::FileStore;

pub mod cli;
pub mod cmd;
pub mod print;
pub mod tui {
    pub mod app;
    pub mod colors;
    pub mod enums;
    pub mod input;
    pub mod run;
    pub mod utils;
}

use cli::Cli;
use cmd::*;

const LOG_ENV: &str = "HRDESK_LOG";

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    // Completions need no state.
    if let Commands::Completions { shell } = cli.command {
        cmd_completions(shell);
        return Ok(());
    }

    let data_dir = config::data_dir(cli.data_dir.as_deref());
    let store = FileStore::open(&data_dir)
        .with_context(|| format!("failed to open data directory {}", data_dir.display()))?;
    let config = Config::load(&data_dir)?;
    let directory = Directory::load(&data_dir)?;
    let mut desk = Portal::init(store, config, directory).context("failed to load portal state")?;

    match cli.command {
        Commands::Ui => cmd_ui(&mut desk)?,
        Commands::Login { email, password } => cmd_login(&mut desk, &email, &password)?,
        Commands::Logout => cmd_logout(&mut desk)?,
        Commands::Whoami => cmd_whoami(&desk)?,
        Commands::Add {
            subject,
            detail,
            status,
            priority,
            progress,
            project,
            assignees,
            start,
            end,
            id,
        } => cmd_add(
            &mut desk, subject, detail, status, priority, progress, project, assignees, start, end, id,
        )?,
        Commands::List {
            query,
            tab,
            status,
            priority,
            mode,
            page,
            page_size,
            more,
        } => cmd_list(&mut desk, query, tab, status, priority, mode, page, page_size, more)?,
        Commands::View { id, history } => cmd_view(&desk, &id, history)?,
        Commands::Update {
            id,
            subject,
            detail,
            status,
            priority,
            progress,
            project,
            assignees,
            start,
            end,
            clear_start,
            clear_end,
        } => cmd_update(
            &mut desk,
            &id,
            subject,
            detail,
            status,
            priority,
            progress,
            project,
            assignees,
            start,
            end,
            clear_start,
            clear_end,
        )?,
        Commands::Progress { id, value } => cmd_progress(&mut desk, &id, value)?,
        Commands::Status { id, status } => cmd_status(&mut desk, &id, status)?,
        Commands::Toggle { id } => cmd_toggle(&mut desk, &id)?,
        Commands::Delete { id } => cmd_delete(&mut desk, &id)?,
        Commands::Projects => cmd_projects(&desk)?,
        Commands::Notif { action } => cmd_notif(&mut desk, action)?,
        Commands::Completions { .. } => {}
    }

    desk.teardown()?;
    Ok(())
}
