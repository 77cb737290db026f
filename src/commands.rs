//! REPL commands
//!
//! Each input line is split with shlex and parsed as a clap subcommand.

use clap::{Parser, Subcommand};
use lull_core::config::Settings;
use lull_core::error::{ClockError, ConfigError};
use lull_core::scheduler::ListenerId;
use std::io::Write;
use thiserror::Error;

use crate::session::CountdownSession;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("error: Invalid quoting")]
    Quoting,

    #[error("{0}")]
    Usage(#[from] clap::Error),

    #[error("error: {0}")]
    Duration(#[from] ClockError),

    #[error("error: {0}")]
    Config(#[from] ConfigError),
}

#[derive(Parser)]
#[command(version, about = "countdown timer")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the countdown (restarts the current second if running)
    Play,
    /// Pause the countdown
    Stop,
    /// Play when paused, pause when playing
    Toggle,
    /// Stop and rewind to the full duration
    Reset,
    /// Set the countdown length, e.g. 90, 90s, 25m, 1.5h
    Duration { value: String },
    /// Print a message once when the countdown reaches a tick
    At {
        tick: u64,
        #[arg(required = true, trailing_var_arg = true)]
        message: Vec<String>,
    },
    /// Print a message on every tick from the given one onward
    Every {
        tick: u64,
        #[arg(required = true, trailing_var_arg = true)]
        message: Vec<String>,
    },
    /// Remove a reminder by id
    Cancel { id: u64 },
    /// Show timer state and reminders
    Status,
    /// Restore default settings
    ResetSettings,
    Exit,
}

/// Run one REPL line against the session. Returns true to quit.
pub fn respond(line: &str, session: &mut CountdownSession) -> Result<bool, CommandError> {
    let mut args = shlex::split(line).ok_or(CommandError::Quoting)?;
    args.insert(0, "lull".to_string());
    let cli = Cli::try_parse_from(args)?;

    match cli.command {
        Some(Commands::Play) => session.play(),
        Some(Commands::Stop) => session.stop(),
        Some(Commands::Toggle) => session.toggle(),
        Some(Commands::Reset) => session.reset(),
        Some(Commands::Duration { value }) => {
            let secs = session.set_duration(&value)?;
            println!("duration set to {}", lull_core::format_clock(secs));
        }
        Some(Commands::At { tick, message }) => remind(session, tick, message, false),
        Some(Commands::Every { tick, message }) => remind(session, tick, message, true),
        Some(Commands::Cancel { id }) => {
            if !session.cancel(ListenerId::from(id)) {
                println!("no reminder with id {id}");
            }
        }
        Some(Commands::Status) => println!("{}", session.status()),
        Some(Commands::ResetSettings) => {
            session.replace_settings(Settings::clear()?);
            println!("settings restored to defaults");
        }
        Some(Commands::Exit) => {
            exit();
            return Ok(true);
        }
        None => {}
    }
    Ok(false)
}

fn remind(session: &mut CountdownSession, tick: u64, message: Vec<String>, recurring: bool) {
    match session.remind(tick, message.join(" "), recurring) {
        Some(id) => println!("reminder {id} set for tick {tick}"),
        None => println!("reminder tick must be at least 1"),
    }
}

pub fn exit() {
    write!(std::io::stdout(), "quitting...").ok();
    std::io::stdout().flush().ok();
}
