//! Interactive command flows
//!
//! Every flow follows the same skeleton: resolve the workspace, check that
//! its preferences can be located, prompt for a value, prompt for a scope,
//! then commit or hand off to an external action. A flow ends at the first
//! step that is absent, and nothing is written or invoked before every
//! prompt has answered.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::actions::{ActionError, ActionKind, DeployRequest, ExternalActions};
use crate::endpoint::TeamNumber;
use crate::error::RiolinkError;
use crate::interaction::{InteractionAdapter, InteractionError};
use crate::preferences::{
    Preference, PreferenceError, PreferenceKey, PreferenceScope, PreferenceStore,
};
use crate::step::Absence;
use crate::workspace::{Workspace, WorkspaceHost, WorkspaceResolver};

pub const TEAM_NUMBER_PROMPT: &str = "Enter a team number";
pub const LANGUAGE_PROMPT: &str = "Pick a language";
pub const SCOPE_PROMPT: &str = "Save globally or project level?";
pub const AUTO_SAVE_PROMPT: &str = "Automatically save on deploy?";
pub const AUTO_START_RIO_LOG_PROMPT: &str = "Automatically start RioLog on deploy?";

const SCOPE_CHOICES: [PreferenceScope; 2] = [PreferenceScope::Global, PreferenceScope::Project];

/// One entry of the command surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    StartRioLog,
    SetTeamNumber,
    StartTool,
    Deploy,
    Debug,
    SetLanguage,
    SetAutoSave,
    SetStartRioLog,
    CreateExample,
    CreateTemplate,
}

impl Command {
    pub const ALL: [Command; 10] = [
        Command::StartRioLog,
        Command::SetTeamNumber,
        Command::StartTool,
        Command::Deploy,
        Command::Debug,
        Command::SetLanguage,
        Command::SetAutoSave,
        Command::SetStartRioLog,
        Command::CreateExample,
        Command::CreateTemplate,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Command::StartRioLog => "start-rio-log",
            Command::SetTeamNumber => "set-team-number",
            Command::StartTool => "start-tool",
            Command::Deploy => "deploy",
            Command::Debug => "debug",
            Command::SetLanguage => "set-language",
            Command::SetAutoSave => "set-auto-save",
            Command::SetStartRioLog => "set-start-rio-log",
            Command::CreateExample => "create-example",
            Command::CreateTemplate => "create-template",
        }
    }

    /// Whether the flow starts by resolving a workspace
    pub fn needs_workspace(&self) -> bool {
        !matches!(
            self,
            Command::StartTool | Command::CreateExample | Command::CreateTemplate
        )
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a flow ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowOutcome {
    /// A preference was written
    Committed {
        workspace: Workspace,
        scope: PreferenceScope,
        preference: Preference,
    },
    /// An external action ran
    Invoked(ActionKind),
    /// The flow stopped early; any notice has already been shown
    Aborted(Absence),
}

/// Early exit from a flow
enum Stop {
    Abort(Absence),
    Fail(RiolinkError),
}

impl From<Absence> for Stop {
    fn from(absence: Absence) -> Self {
        Stop::Abort(absence)
    }
}

impl From<InteractionError> for Stop {
    fn from(err: InteractionError) -> Self {
        match err {
            InteractionError::Cancelled => Stop::Abort(Absence::Cancelled),
            other => Stop::Fail(other.into()),
        }
    }
}

impl From<PreferenceError> for Stop {
    fn from(err: PreferenceError) -> Self {
        Stop::Fail(err.into())
    }
}

impl From<ActionError> for Stop {
    fn from(err: ActionError) -> Self {
        Stop::Fail(err.into())
    }
}

type FlowResult = Result<FlowOutcome, Stop>;

/// An adapter answered with an index the prompt never offered
fn out_of_range(what: &str, index: usize) -> Stop {
    let message = format!("{} index {} out of range", what, index);
    Stop::Fail(InteractionError::InvalidInput(message).into())
}

/// Runs command flows against injected collaborators
pub struct CommandOrchestrator {
    interaction: Arc<dyn InteractionAdapter>,
    store: Arc<dyn PreferenceStore>,
    actions: Arc<dyn ExternalActions>,
    host: Arc<dyn WorkspaceHost>,
    resolver: WorkspaceResolver,
    languages: Vec<String>,
}

impl CommandOrchestrator {
    pub fn new(
        interaction: Arc<dyn InteractionAdapter>,
        store: Arc<dyn PreferenceStore>,
        actions: Arc<dyn ExternalActions>,
        host: Arc<dyn WorkspaceHost>,
        languages: Vec<String>,
    ) -> Self {
        Self {
            resolver: WorkspaceResolver::new(interaction.clone()),
            interaction,
            store,
            actions,
            host,
            languages,
        }
    }

    /// Run one flow to completion
    ///
    /// Aborts are not errors: they come back as `FlowOutcome::Aborted` after
    /// the matching notice (if any) was shown. Errors are real failures such
    /// as a lost terminal or a preference file that cannot be written.
    pub async fn run(&self, command: Command) -> Result<FlowOutcome, RiolinkError> {
        debug!(command = %command, "running flow");
        match self.flow(command).await {
            Ok(outcome) => Ok(outcome),
            Err(Stop::Abort(absence)) => {
                if let Some(notice) = absence.notice() {
                    match &absence {
                        Absence::InvalidInput(_) => self.interaction.print_warning(&notice),
                        _ => self.interaction.print_info(&notice),
                    }
                }
                debug!(command = %command, reason = %absence, "flow aborted");
                Ok(FlowOutcome::Aborted(absence))
            }
            Err(Stop::Fail(err)) => Err(err),
        }
    }

    async fn flow(&self, command: Command) -> FlowResult {
        match command {
            Command::StartTool => {
                self.actions.start_tool().await?;
                Ok(FlowOutcome::Invoked(ActionKind::StartTool))
            }
            Command::CreateExample => {
                self.actions.create_example().await?;
                Ok(FlowOutcome::Invoked(ActionKind::CreateExample))
            }
            Command::CreateTemplate => {
                self.actions.create_template().await?;
                Ok(FlowOutcome::Invoked(ActionKind::CreateTemplate))
            }
            Command::StartRioLog => self.start_rio_log().await,
            Command::Deploy => self.deploy(ActionKind::Deploy).await,
            Command::Debug => self.deploy(ActionKind::Debug).await,
            Command::SetTeamNumber => self.set_team_number().await,
            Command::SetLanguage => self.set_language().await,
            Command::SetAutoSave => {
                self.set_flag(AUTO_SAVE_PROMPT, Preference::AutoSaveOnDeploy)
                    .await
            }
            Command::SetStartRioLog => {
                self.set_flag(AUTO_START_RIO_LOG_PROMPT, Preference::AutoStartRioLog)
                    .await
            }
        }
    }

    /// Resolve the workspace and check that its preferences exist
    async fn workspace(&self) -> Result<Workspace, Stop> {
        let open = self.host.open_workspaces();
        let workspace = self.resolver.resolve(&open).await?.into_result()?;
        if !self.store.contains(&workspace) {
            return Err(Absence::WorkspaceNotFound.into());
        }
        Ok(workspace)
    }

    async fn start_rio_log(&self) -> FlowResult {
        let workspace = self.workspace().await?;
        let team = self
            .store
            .get(&workspace, PreferenceKey::TeamNumber)
            .as_team()
            .ok_or(Absence::NoTeamNumber)?;
        self.actions.start_rio_log(&workspace, team, true).await?;
        Ok(FlowOutcome::Invoked(ActionKind::RioLog))
    }

    async fn deploy(&self, kind: ActionKind) -> FlowResult {
        let workspace = self.workspace().await?;
        let preferences = self.store.resolved(&workspace);
        let request = DeployRequest {
            workspace,
            team: preferences.team_number,
            save_first: preferences.auto_save_on_deploy,
            start_rio_log: preferences.auto_start_rio_log,
        };

        if kind == ActionKind::Debug {
            self.actions.debug(&request).await?;
        } else {
            self.actions.deploy(&request).await?;
        }
        info!(action = %kind, workspace = %request.workspace.name(), "action finished");

        if request.start_rio_log {
            match request.team {
                Some(team) => {
                    self.actions
                        .start_rio_log(&request.workspace, team, false)
                        .await?
                }
                None => debug!("no team number, not starting rio log"),
            }
        }
        Ok(FlowOutcome::Invoked(kind))
    }

    async fn set_team_number(&self) -> FlowResult {
        let workspace = self.workspace().await?;
        let current = self
            .store
            .get(&workspace, PreferenceKey::TeamNumber)
            .as_team()
            .map(|team| team.to_string());

        let input = self
            .interaction
            .ask_text(TEAM_NUMBER_PROMPT, current.as_deref())
            .await?;
        let team = TeamNumber::parse(&input).map_err(|e| Absence::InvalidInput(e.to_string()))?;

        let scope = self.ask_scope().await?;
        self.commit(workspace, Preference::TeamNumber(team), scope)
    }

    async fn set_language(&self) -> FlowResult {
        let workspace = self.workspace().await?;
        if self.languages.is_empty() {
            return Err(Absence::NoChoices.into());
        }

        let index = self
            .interaction
            .ask_select(LANGUAGE_PROMPT, &self.languages)
            .await?;
        let language = self
            .languages
            .get(index)
            .cloned()
            .ok_or_else(|| out_of_range("language", index))?;

        let scope = self.ask_scope().await?;
        self.commit(workspace, Preference::CurrentLanguage(language), scope)
    }

    async fn set_flag(&self, prompt: &str, preference: fn(bool) -> Preference) -> FlowResult {
        let workspace = self.workspace().await?;
        let options = ["Yes".to_string(), "No".to_string()];
        let index = self.interaction.ask_select(prompt, &options).await?;
        let enabled = [true, false]
            .get(index)
            .copied()
            .ok_or_else(|| out_of_range("yes/no", index))?;
        let scope = self.ask_scope().await?;
        self.commit(workspace, preference(enabled), scope)
    }

    async fn ask_scope(&self) -> Result<PreferenceScope, Stop> {
        let labels: Vec<String> = SCOPE_CHOICES.iter().map(|s| s.label().to_string()).collect();
        let index = self.interaction.ask_select(SCOPE_PROMPT, &labels).await?;
        SCOPE_CHOICES
            .get(index)
            .copied()
            .ok_or_else(|| out_of_range("scope", index))
    }

    fn commit(
        &self,
        workspace: Workspace,
        preference: Preference,
        scope: PreferenceScope,
    ) -> FlowResult {
        self.store.set(&workspace, preference.clone(), scope)?;
        info!(
            key = %preference.key(),
            scope = %scope,
            workspace = %workspace.name(),
            "preference saved"
        );
        Ok(FlowOutcome::Committed {
            workspace,
            scope,
            preference,
        })
    }
}
