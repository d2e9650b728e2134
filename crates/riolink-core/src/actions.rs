//! External actions the command flows hand off to
//!
//! Deploying, debugging, starting the log viewer and scaffolding projects are
//! done by outside tooling. Flows build a request from resolved preferences
//! and call through [`ExternalActions`]; what runs behind it is up to the
//! host.

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

use crate::endpoint::TeamNumber;
use crate::workspace::Workspace;

/// Error type for external actions
#[derive(Error, Debug)]
pub enum ActionError {
    /// No command is configured for the action
    #[error("no command configured for {0}")]
    NotConfigured(ActionKind),

    /// The action needs a team number and none is set
    #[error("{0} needs a team number; run set-team-number first")]
    NoTeamNumber(ActionKind),

    /// The action ran and reported failure
    #[error("{action} failed: {message}")]
    Failed { action: ActionKind, message: String },

    /// The action could not be started
    #[error("failed to start {action}: {source}")]
    Spawn {
        action: ActionKind,
        #[source]
        source: std::io::Error,
    },
}

/// Which external action ran
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    StartTool,
    Deploy,
    Debug,
    RioLog,
    CreateExample,
    CreateTemplate,
}

impl ActionKind {
    pub fn name(&self) -> &'static str {
        match self {
            ActionKind::StartTool => "start-tool",
            ActionKind::Deploy => "deploy",
            ActionKind::Debug => "debug",
            ActionKind::RioLog => "rio-log",
            ActionKind::CreateExample => "create-example",
            ActionKind::CreateTemplate => "create-template",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything a deploy or debug run needs, resolved before the call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployRequest {
    pub workspace: Workspace,
    pub team: Option<TeamNumber>,
    /// Save open editors before building
    pub save_first: bool,
    /// Start the log viewer once the deploy succeeds
    pub start_rio_log: bool,
}

/// Black-box collaborators behind the command surface
#[async_trait]
pub trait ExternalActions: Send + Sync {
    async fn start_tool(&self) -> Result<(), ActionError>;

    async fn deploy(&self, request: &DeployRequest) -> Result<(), ActionError>;

    async fn debug(&self, request: &DeployRequest) -> Result<(), ActionError>;

    /// Open a log session for `team`; `show` brings the viewer to front
    async fn start_rio_log(
        &self,
        workspace: &Workspace,
        team: TeamNumber,
        show: bool,
    ) -> Result<(), ActionError>;

    async fn create_example(&self) -> Result<(), ActionError>;

    async fn create_template(&self) -> Result<(), ActionError>;
}
