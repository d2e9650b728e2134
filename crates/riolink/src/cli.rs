//! CLI argument parsing with clap derive

use clap::{Parser, Subcommand};
use riolink_core::Command;
use std::path::PathBuf;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// riolink: roboRIO reachability monitor and robot project commands
#[derive(Parser, Debug)]
#[command(name = "riolink")]
#[command(version = VERSION)]
#[command(about = "Watch roboRIO reachability and run deploy, debug and preference commands")]
pub struct Cli {
    /// Increase log verbosity (debug level unless RUST_LOG is set)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Open workspace root, repeatable
    ///
    /// Defaults to the robot project containing the current directory.
    #[arg(short, long = "workspace", value_name = "DIR", global = true)]
    pub workspaces: Vec<PathBuf>,

    /// Do not run the connection monitor alongside the command
    #[arg(long, global = true)]
    pub no_monitor: bool,

    /// Global preferences file (defaults to the user config directory)
    #[arg(long, value_name = "FILE", global = true)]
    pub preferences: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Poll the roboRIO until interrupted
    Monitor,

    /// Open a RioLog session for the configured team
    StartRioLog,

    /// Set the team number
    SetTeamNumber,

    /// Launch the WPILib tool
    StartTool,

    /// Deploy robot code
    Deploy,

    /// Deploy robot code and attach a debugger
    Debug,

    /// Set the project language
    SetLanguage,

    /// Set whether files are saved before deploying
    SetAutoSave,

    /// Set whether RioLog starts after deploying
    SetStartRioLog,

    /// Create a project from an example
    CreateExample,

    /// Create a project from a template
    CreateTemplate,
}

impl Commands {
    /// The flow to run, `None` for the monitor-only mode
    pub fn flow(self) -> Option<Command> {
        match self {
            Commands::Monitor => None,
            Commands::StartRioLog => Some(Command::StartRioLog),
            Commands::SetTeamNumber => Some(Command::SetTeamNumber),
            Commands::StartTool => Some(Command::StartTool),
            Commands::Deploy => Some(Command::Deploy),
            Commands::Debug => Some(Command::Debug),
            Commands::SetLanguage => Some(Command::SetLanguage),
            Commands::SetAutoSave => Some(Command::SetAutoSave),
            Commands::SetStartRioLog => Some(Command::SetStartRioLog),
            Commands::CreateExample => Some(Command::CreateExample),
            Commands::CreateTemplate => Some(Command::CreateTemplate),
        }
    }
}

/// Parse CLI arguments from the environment
pub fn parse() -> Cli {
    Cli::parse()
}
