//! Core library for riolink
//!
//! Watches whether the roboRIO is reachable and runs the interactive
//! preference and deploy flows behind the `riolink` CLI. The binary crate
//! supplies the terminal prompts and the external commands; everything
//! here talks to them through traits.

/// External deploy, debug, log and scaffolding actions
pub mod actions;

/// Workspace configuration (`.wpilib/riolink.toml`)
pub mod config;

/// One bounded-time reachability probe
pub mod connector;

/// Team numbers and the hosts derived from them
pub mod endpoint;

/// Error types
pub mod error;

/// Prompt adapter trait for host-agnostic user interaction
pub mod interaction;

/// The perpetual, cancellable polling loop
pub mod monitor;

/// Command flows
pub mod orchestrator;

/// Two-tier scoped preferences
pub mod preferences;

/// Value-or-absence outcome of an interactive step
pub mod step;

/// Open workspaces and workspace selection
pub mod workspace;

pub use actions::{ActionError, ActionKind, DeployRequest, ExternalActions};
pub use config::RiolinkConfig;
pub use connector::{
    AttemptOutcome, ConnectionAttempt, ConnectorSettings, FailureReason, RobotConnector,
    TcpRobotConnector, TeamSource,
};
pub use endpoint::{Endpoint, EndpointError, TeamNumber};
pub use error::{Result, RiolinkError};
pub use interaction::{InteractionAdapter, InteractionError, InteractionResult};
pub use monitor::{AttemptReporter, ConnectionMonitor, LinkStatus, MonitorHandle};
pub use orchestrator::{Command, CommandOrchestrator, FlowOutcome};
pub use preferences::{
    Preference, PreferenceKey, PreferenceScope, PreferenceStore, PreferenceValue,
    ScopedPreferenceStore,
};
pub use step::{Absence, Step};
pub use workspace::{Workspace, WorkspaceHost, WorkspaceResolver};
