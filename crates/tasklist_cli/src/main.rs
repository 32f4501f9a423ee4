//! Operator CLI for a TaskList database.
//!
//! # Responsibility
//! - Manage users and issue/revoke session tokens (sessions are created out of band).
//! - Print an owner's task list in display order.

use std::{path::PathBuf, process::ExitCode, time::Duration};

use clap::{Parser, Subcommand};
use log::warn;
use tasklist_core::{
    db::{open_db, DbError},
    LogTarget, RepoError, SqliteSessionStore, SqliteTaskRepository, SqliteUserRepository,
    TaskRepository, UserRepository, DEFAULT_SESSION_TTL,
};
use thiserror::Error;

#[derive(Parser)]
#[command(name = "tasklist_cli")]
#[command(about = "Administer a TaskList database", version)]
struct Cli {
    /// SQLite database file
    #[arg(long, env = "TASKLIST_DB_PATH", default_value = "tasklist.sqlite3")]
    db: PathBuf,

    /// Log level written to stderr
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage users
    #[command(subcommand)]
    User(UserCommand),
    /// Manage sessions
    #[command(subcommand)]
    Session(SessionCommand),
    /// List an owner's tasks, pending first, newest first
    Tasks { owner: String },
}

#[derive(Subcommand)]
enum UserCommand {
    Add {
        id: String,
        name: String,
        email: String,
    },
    /// Removes the user with their sessions and tasks
    Remove { id: String },
}

#[derive(Subcommand)]
enum SessionCommand {
    /// Prints a new bearer token for the user
    Issue {
        user_id: String,
        #[arg(long)]
        ttl_hours: Option<u64>,
    },
    Revoke { token: String },
}

#[derive(Error, Debug)]
enum CliError {
    #[error("{0}")]
    Db(#[from] DbError),

    #[error("{0}")]
    Repo(#[from] RepoError),

    #[error("no user with id `{0}`")]
    UnknownUser(String),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = tasklist_core::init_logging(&cli.log_level, LogTarget::Stderr) {
        eprintln!("warning: logging disabled: {err}");
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let conn = open_db(&cli.db)?;

    match cli.command {
        Commands::User(UserCommand::Add { id, name, email }) => {
            let user = SqliteUserRepository::new(&conn).create_user(&id, &name, &email)?;
            println!("added user id={} email={}", user.id, user.email);
        }
        Commands::User(UserCommand::Remove { id }) => {
            if !SqliteUserRepository::new(&conn).delete_user(&id)? {
                return Err(CliError::UnknownUser(id));
            }
            println!("removed user id={id}");
        }
        Commands::Session(SessionCommand::Issue { user_id, ttl_hours }) => {
            if SqliteUserRepository::new(&conn).get_user(&user_id)?.is_none() {
                return Err(CliError::UnknownUser(user_id));
            }
            let ttl = ttl_hours
                .map(|hours| Duration::from_secs(hours.saturating_mul(60 * 60)))
                .unwrap_or(DEFAULT_SESSION_TTL);
            let session = SqliteSessionStore::new(&conn).issue(&user_id, ttl)?;
            println!("{}", session.token);
        }
        Commands::Session(SessionCommand::Revoke { token }) => {
            if SqliteSessionStore::new(&conn).revoke(&token)? {
                println!("revoked");
            } else {
                warn!("event=session_revoke module=cli status=skip reason=unknown_token");
                println!("no such session");
            }
        }
        Commands::Tasks { owner } => {
            let tasks = SqliteTaskRepository::new(&conn).list_by_owner(&owner)?;
            if tasks.is_empty() {
                println!("no tasks for {owner}");
            }
            for task in tasks {
                let mark = if task.is_completed() { 'x' } else { ' ' };
                println!("[{mark}] {}  {}", task.id, task.text);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{Cli, Commands, SessionCommand};
    use clap::{CommandFactory, Parser};

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_session_issue_with_ttl() {
        let cli = Cli::try_parse_from([
            "tasklist_cli",
            "--db",
            "/tmp/t.sqlite3",
            "session",
            "issue",
            "u1",
            "--ttl-hours",
            "2",
        ])
        .unwrap();
        assert_eq!(cli.db.to_str(), Some("/tmp/t.sqlite3"));
        assert!(matches!(
            cli.command,
            Commands::Session(SessionCommand::Issue { ref user_id, ttl_hours: Some(2) }) if user_id == "u1"
        ));
    }
}
