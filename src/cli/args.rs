//! Command-line argument parsing for the kaiwa CLI.
//!
//! This module turns the raw argument list into a [`CliCommand`]. It does
//! no I/O; execution lives in [`super::run_cli_command`].

use thiserror::Error;

/// Parsed CLI command to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    /// Show version information
    Version,
    /// Show usage
    Help,
    /// List threads, most recently updated first
    Threads,
    /// Create a thread (default title when none is given)
    New { title: Option<String> },
    /// Show one thread
    Show { thread_id: String },
    /// Rename a thread
    Rename { thread_id: String, title: String },
    /// Delete a thread
    Delete { thread_id: String },
    /// Print a thread's messages in chronological order
    Messages { thread_id: String },
    /// Send a message and print the reply
    Send { thread_id: String, content: String },
    /// Delete one message
    DeleteMessage { message_id: String },
    /// Query the backend health endpoint
    Health,
}

/// Why the argument list could not be turned into a command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgsError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("`{command}` requires <{argument}>")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },
}

/// Usage text printed by `--help`.
pub const USAGE: &str = "\
Usage: kaiwa <command> [args]

Commands:
  threads                     List threads, most recently updated first
  new [title...]              Create a thread
  show <thread-id>            Show one thread
  rename <thread-id> <title...>
                              Rename a thread
  delete <thread-id>          Delete a thread
  messages <thread-id>        Print a thread's messages
  send <thread-id> <text...>  Send a message and print the reply
  delete-message <message-id> Delete a message
  health                      Check the backend

Options:
  -h, --help                  Show this help
  -V, --version               Show version

Environment:
  KAIWA_API_BASE_URL          Backend base URL (default http://localhost:5001/api)
  KAIWA_API_TIMEOUT_MS        Request timeout in milliseconds (default 30000)
  RUST_LOG                    Log filter (default warn)";

/// Parse command-line arguments and return the command to execute.
///
/// `args` includes the program name, as from `std::env::args()`. Flags win
/// over commands; no arguments at all means [`CliCommand::Help`].
///
/// # Examples
///
/// ```
/// use kaiwa::cli::args::{parse_args, CliCommand};
///
/// let args = vec!["kaiwa".to_string(), "--version".to_string()];
/// assert_eq!(parse_args(args.into_iter()), Ok(CliCommand::Version));
/// ```
pub fn parse_args<I>(args: I) -> Result<CliCommand, ArgsError>
where
    I: Iterator<Item = String>,
{
    // Skip the program name
    let args: Vec<String> = args.skip(1).collect();

    for arg in &args {
        match arg.as_str() {
            "--version" | "-V" => return Ok(CliCommand::Version),
            "--help" | "-h" => return Ok(CliCommand::Help),
            _ => {}
        }
    }

    let Some((command, rest)) = args.split_first() else {
        return Ok(CliCommand::Help);
    };

    let command = match command.as_str() {
        "threads" | "ls" => CliCommand::Threads,
        "new" => CliCommand::New {
            title: joined(rest),
        },
        "show" => CliCommand::Show {
            thread_id: required(rest, 0, "show", "thread-id")?,
        },
        "rename" => CliCommand::Rename {
            thread_id: required(rest, 0, "rename", "thread-id")?,
            title: joined(rest.get(1..).unwrap_or_default()).ok_or(ArgsError::MissingArgument {
                command: "rename",
                argument: "title",
            })?,
        },
        "delete" | "rm" => CliCommand::Delete {
            thread_id: required(rest, 0, "delete", "thread-id")?,
        },
        "messages" => CliCommand::Messages {
            thread_id: required(rest, 0, "messages", "thread-id")?,
        },
        "send" => CliCommand::Send {
            thread_id: required(rest, 0, "send", "thread-id")?,
            // Blank text is passed through; the store rejects it.
            content: rest.get(1..).unwrap_or_default().join(" "),
        },
        "delete-message" => CliCommand::DeleteMessage {
            message_id: required(rest, 0, "delete-message", "message-id")?,
        },
        "health" => CliCommand::Health,
        other => return Err(ArgsError::UnknownCommand(other.to_string())),
    };
    Ok(command)
}

fn required(
    args: &[String],
    index: usize,
    command: &'static str,
    argument: &'static str,
) -> Result<String, ArgsError> {
    args.get(index)
        .filter(|value| !value.is_empty())
        .cloned()
        .ok_or(ArgsError::MissingArgument { command, argument })
}

/// Join the remaining words, or `None` when there are none.
fn joined(args: &[String]) -> Option<String> {
    let text = args.join(" ");
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}
