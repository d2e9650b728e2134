//! riolink: roboRIO reachability monitor and robot project commands

mod actions;
mod cli;
mod prompt;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use riolink_core::preferences::{PreferenceTeamSource, TomlPersistence};
use riolink_core::workspace::find_project_root_from;
use riolink_core::{
    Command, CommandOrchestrator, ConnectionMonitor, FlowOutcome, LinkStatus, MonitorHandle,
    RiolinkConfig, ScopedPreferenceStore, TcpRobotConnector, Workspace,
};
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::actions::CommandActions;
use crate::cli::Cli;
use crate::prompt::TerminalPrompt;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = cli::parse();

    // RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

/// Explicit `--workspace` roots, else the project containing the current directory
fn open_workspaces(explicit: &[PathBuf]) -> Result<Vec<Workspace>> {
    if !explicit.is_empty() {
        return Ok(explicit.iter().map(Workspace::new).collect());
    }
    let cwd = std::env::current_dir().context("failed to get current directory")?;
    Ok(find_project_root_from(&cwd)
        .map(Workspace::new)
        .into_iter()
        .collect())
}

async fn run(cli: Cli) -> Result<()> {
    let workspaces = open_workspaces(&cli.workspaces)?;
    debug!(count = workspaces.len(), "open workspaces");

    let config = match workspaces.first() {
        Some(workspace) => RiolinkConfig::load_from_project(workspace)?,
        None => RiolinkConfig::default(),
    };

    let persistence = match &cli.preferences {
        Some(path) => TomlPersistence::new(path),
        None => TomlPersistence::in_user_config_dir()
            .context("no user config directory for global preferences")?,
    };
    debug!(path = %persistence.global_path().display(), "global preferences");

    let store = Arc::new(ScopedPreferenceStore::open(Arc::new(persistence))?);
    for workspace in workspaces.iter().filter(|w| w.is_robot_project()) {
        store
            .attach(workspace)
            .with_context(|| format!("failed to load preferences for {}", workspace.label()))?;
    }

    let flow = cli.command.flow();
    let run_monitor = flow.is_none() || (config.monitor.enabled && !cli.no_monitor);
    let monitor = run_monitor.then(|| {
        let team = PreferenceTeamSource::new(store.clone(), workspaces.first().cloned());
        let connector = TcpRobotConnector::new(Arc::new(team), config.monitor.connector_settings());
        // Prompts own the terminal during a flow.
        ConnectionMonitor::new(Arc::new(connector), config.monitor.retry_delay())
            .with_quiet_transitions(flow.is_some())
            .start()
    });

    let result = match (flow, &monitor) {
        (Some(command), _) => {
            let orchestrator = CommandOrchestrator::new(
                Arc::new(TerminalPrompt::new()),
                store.clone(),
                Arc::new(CommandActions::new(config.actions.clone())),
                Arc::new(workspaces.clone()),
                config.languages.choices.clone(),
            );
            run_flow(&orchestrator, command).await
        }
        (None, Some(handle)) => watch_until_interrupted(handle).await,
        (None, None) => Ok(()),
    };

    if let Some(handle) = monitor {
        handle.stop().await;
    }
    result
}

async fn run_flow(orchestrator: &CommandOrchestrator, command: Command) -> Result<()> {
    let outcome = orchestrator
        .run(command)
        .await
        .with_context(|| format!("{} failed", command))?;
    match outcome {
        FlowOutcome::Committed {
            workspace,
            scope,
            preference,
        } => {
            info!(workspace = %workspace.name(), scope = %scope, key = %preference.key(), "saved");
        }
        FlowOutcome::Invoked(kind) => debug!(action = %kind, "invoked"),
        FlowOutcome::Aborted(reason) => debug!(reason = %reason, "nothing done"),
    }
    Ok(())
}

/// Print reachability changes until Ctrl+C
async fn watch_until_interrupted(handle: &MonitorHandle) -> Result<()> {
    let mut status = handle.subscribe();
    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.context("failed to listen for Ctrl+C")?;
                info!("interrupted");
                return Ok(());
            }
            changed = status.changed() => {
                if changed.is_err() {
                    warn!("connection monitor exited");
                    return Ok(());
                }
                match *status.borrow_and_update() {
                    LinkStatus::Connected(addr) => println!("connected: {}", addr),
                    LinkStatus::Disconnected => println!("disconnected"),
                    LinkStatus::Unknown => {}
                }
            }
        }
    }
}
