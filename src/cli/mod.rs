//! CLI module for kaiwa.
//!
//! This module provides the command-line front end over [`ChatSession`]:
//! - Argument parsing
//! - Version and usage display
//! - One command per store action, printed as plain text
//!
//! # Usage
//!
//! ```ignore
//! use kaiwa::cli::{parse_args, run_cli_command};
//!
//! let command = parse_args(std::env::args())?;
//! run_cli_command(command, api, &mut std::io::stdout()).await?;
//! ```

pub mod args;
pub mod version;

pub use args::{parse_args, ArgsError, CliCommand, USAGE};
pub use version::{version_line, VERSION};

use std::io::Write;
use std::sync::Arc;

use color_eyre::eyre::eyre;
use color_eyre::Result;

use crate::api::ApiClient;
use crate::models::{Message, Thread};
use crate::routing::Route;
use crate::session::ChatSession;

/// Execute `command` against the backend behind `api`, writing output to `out`.
pub async fn run_cli_command<W: Write>(
    command: CliCommand,
    api: Arc<ApiClient>,
    out: &mut W,
) -> Result<()> {
    let session = ChatSession::new(Arc::clone(&api));

    match command {
        CliCommand::Version => writeln!(out, "{}", version_line())?,
        CliCommand::Help => writeln!(out, "{}", USAGE)?,
        CliCommand::Threads => {
            session.load().await?;
            let threads = session.threads().sorted_threads();
            if threads.is_empty() {
                writeln!(out, "No threads yet.")?;
            }
            for thread in &threads {
                writeln!(out, "{}", format_thread(thread))?;
            }
        }
        CliCommand::New { title } => {
            let thread = session.start_thread(title.as_deref()).await?;
            writeln!(out, "Created {}", format_thread(&thread))?;
        }
        CliCommand::Show { thread_id } => {
            let thread = session.threads().refresh_thread(&thread_id).await?;
            writeln!(out, "{}", format_thread(&thread))?;
            writeln!(out, "created {}", thread.created_at.format("%Y-%m-%d %H:%M:%S"))?;
        }
        CliCommand::Rename { thread_id, title } => {
            let thread = session.rename_thread(&thread_id, &title).await?;
            writeln!(out, "Renamed {}", format_thread(&thread))?;
        }
        CliCommand::Delete { thread_id } => {
            session.delete_thread(&thread_id).await?;
            writeln!(out, "Deleted thread {}", thread_id)?;
        }
        CliCommand::Messages { thread_id } => {
            session.navigate(Route::Thread(thread_id)).await?;
            let messages = session.messages().sorted_messages();
            if messages.is_empty() {
                writeln!(out, "No messages yet.")?;
            }
            for message in &messages {
                writeln!(out, "{}", format_message(message))?;
            }
        }
        CliCommand::Send { thread_id, content } => {
            session.navigate(Route::Thread(thread_id)).await?;
            let response = session.send(&content).await?;
            writeln!(out, "{}", format_message(&response.assistant_message))?;
        }
        CliCommand::DeleteMessage { message_id } => {
            session.messages().delete_message(&message_id).await?;
            writeln!(out, "Deleted message {}", message_id)?;
        }
        CliCommand::Health => {
            let health = api.health_check().await?;
            writeln!(out, "status: {}", health.status)?;
            if let Some(database) = &health.database {
                writeln!(out, "database: {}", database)?;
            }
            if let Some(environment) = &health.environment {
                writeln!(out, "environment: {}", environment)?;
            }
            if !health.is_ok() {
                return Err(eyre!("backend at {} is unhealthy: {}", api.base_url(), health.status));
            }
        }
    }
    Ok(())
}

/// One-line summary of a thread.
pub fn format_thread(thread: &Thread) -> String {
    format!(
        "{}  {}  {}",
        thread.id,
        thread.updated_at.format("%Y-%m-%d %H:%M"),
        thread.title
    )
}

/// A message as `[HH:MM:SS] role: content`.
pub fn format_message(message: &Message) -> String {
    format!(
        "[{}] {}: {}",
        message.created_at.format("%H:%M:%S"),
        message.role,
        message.content
    )
}
