//! External actions as configured shell commands
//!
//! Each action is an argv template from `[actions]` in `riolink.toml`.
//! `{team}` and `{workspace}` are substituted before the command runs, and
//! the same values are exported as `RIOLINK_TEAM` / `RIOLINK_WORKSPACE`.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use riolink_core::config::ActionsConfig;
use riolink_core::{
    ActionError, ActionKind, DeployRequest, ExternalActions, TeamNumber, Workspace,
};
use tokio::process::Command;
use tracing::{debug, info};

const TEAM_PLACEHOLDER: &str = "{team}";
const WORKSPACE_PLACEHOLDER: &str = "{workspace}";

/// Values available to a template
#[derive(Debug, Default, Clone, Copy)]
struct Context<'a> {
    team: Option<TeamNumber>,
    workspace: Option<&'a Path>,
}

/// Expand placeholders in `template`
fn expand(
    kind: ActionKind,
    template: &[String],
    ctx: Context<'_>,
) -> Result<Vec<String>, ActionError> {
    if template.is_empty() {
        return Err(ActionError::NotConfigured(kind));
    }

    template
        .iter()
        .map(|arg| -> Result<String, ActionError> {
            let mut arg = arg.clone();
            if arg.contains(TEAM_PLACEHOLDER) {
                let team = ctx.team.ok_or(ActionError::NoTeamNumber(kind))?;
                arg = arg.replace(TEAM_PLACEHOLDER, &team.to_string());
            }
            if let Some(workspace) = ctx.workspace {
                arg = arg.replace(WORKSPACE_PLACEHOLDER, &workspace.display().to_string());
            }
            Ok(arg)
        })
        .collect()
}

/// Runs `[actions]` templates as child processes
pub struct CommandActions {
    config: ActionsConfig,
}

impl CommandActions {
    pub fn new(config: ActionsConfig) -> Self {
        Self { config }
    }

    fn command(&self, kind: ActionKind, ctx: Context<'_>) -> Result<Command, ActionError> {
        let template = match kind {
            ActionKind::StartTool => &self.config.start_tool,
            ActionKind::Deploy => &self.config.deploy,
            ActionKind::Debug => &self.config.debug,
            ActionKind::RioLog => &self.config.rio_log,
            ActionKind::CreateExample => &self.config.create_example,
            ActionKind::CreateTemplate => &self.config.create_template,
        };
        let argv = expand(kind, template, ctx)?;
        debug!(action = %kind, argv = ?argv, "running action");

        let mut cmd = Command::new(&argv[0]);
        cmd.args(&argv[1..]);
        if let Some(team) = ctx.team {
            cmd.env("RIOLINK_TEAM", team.to_string());
        }
        if let Some(workspace) = ctx.workspace {
            cmd.current_dir(workspace);
            cmd.env("RIOLINK_WORKSPACE", workspace);
        }
        Ok(cmd)
    }

    /// Run to completion; a non-zero exit is a failure
    async fn run(&self, kind: ActionKind, ctx: Context<'_>) -> Result<(), ActionError> {
        self.run_with(kind, ctx, |_| {}).await
    }

    async fn run_with(
        &self,
        kind: ActionKind,
        ctx: Context<'_>,
        configure: impl FnOnce(&mut Command),
    ) -> Result<(), ActionError> {
        let mut cmd = self.command(kind, ctx)?;
        configure(&mut cmd);
        let status = cmd
            .status()
            .await
            .map_err(|source| ActionError::Spawn {
                action: kind,
                source,
            })?;
        if status.success() {
            info!(action = %kind, "action succeeded");
            Ok(())
        } else {
            Err(ActionError::Failed {
                action: kind,
                message: status.to_string(),
            })
        }
    }

    async fn deploy_like(
        &self,
        kind: ActionKind,
        request: &DeployRequest,
    ) -> Result<(), ActionError> {
        let ctx = Context {
            team: request.team,
            workspace: Some(request.workspace.root()),
        };
        let save_first = request.save_first;
        self.run_with(kind, ctx, |cmd| {
            cmd.env("RIOLINK_SAVE_FIRST", if save_first { "1" } else { "0" });
        })
        .await
    }
}

#[async_trait]
impl ExternalActions for CommandActions {
    async fn start_tool(&self) -> Result<(), ActionError> {
        self.run(ActionKind::StartTool, Context::default()).await
    }

    async fn deploy(&self, request: &DeployRequest) -> Result<(), ActionError> {
        self.deploy_like(ActionKind::Deploy, request).await
    }

    async fn debug(&self, request: &DeployRequest) -> Result<(), ActionError> {
        self.deploy_like(ActionKind::Debug, request).await
    }

    /// The log viewer outlives the command, so it is spawned, not awaited;
    /// without `show` it runs in the background with its output discarded.
    async fn start_rio_log(
        &self,
        workspace: &Workspace,
        team: TeamNumber,
        show: bool,
    ) -> Result<(), ActionError> {
        let ctx = Context {
            team: Some(team),
            workspace: Some(workspace.root()),
        };
        let mut cmd = self.command(ActionKind::RioLog, ctx)?;
        if !show {
            cmd.stdout(Stdio::null()).stderr(Stdio::null());
        }
        let child = cmd.spawn().map_err(|source| ActionError::Spawn {
            action: ActionKind::RioLog,
            source,
        })?;
        info!(team = %team, pid = ?child.id(), show, "rio log started");
        Ok(())
    }

    async fn create_example(&self) -> Result<(), ActionError> {
        self.run(ActionKind::CreateExample, Context::default()).await
    }

    async fn create_template(&self) -> Result<(), ActionError> {
        self.run(ActionKind::CreateTemplate, Context::default()).await
    }
}
