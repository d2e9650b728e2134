//! Configuration handling for riolink

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::connector::ConnectorSettings;
use crate::error::RiolinkError;
use crate::workspace::Workspace;

/// File name of the workspace config inside `.wpilib/`
pub const CONFIG_FILE: &str = "riolink.toml";

/// Riolink configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RiolinkConfig {
    /// Connection monitor settings
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// Languages offered by set-language
    #[serde(default)]
    pub languages: LanguagesConfig,

    /// Commands run for the external actions
    #[serde(default)]
    pub actions: ActionsConfig,
}

/// Connection monitor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Run the monitor alongside commands
    #[serde(default = "default_monitor_enabled")]
    pub enabled: bool,

    #[serde(default = "default_primary_port")]
    pub primary_port: u16,

    #[serde(default = "default_fallback_port")]
    pub fallback_port: u16,

    /// Budget for one attempt, in milliseconds
    #[serde(default = "default_attempt_timeout_ms")]
    pub attempt_timeout_ms: u64,

    /// Pause between attempts, in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Hosts to probe instead of the roboRIO candidates
    #[serde(default)]
    pub hosts: Vec<String>,
}

/// Language choices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguagesConfig {
    #[serde(default = "default_language_choices")]
    pub choices: Vec<String>,
}

/// Argv templates for external actions
///
/// `{team}` and `{workspace}` are replaced before the command runs. An empty
/// template means the action is not configured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ActionsConfig {
    #[serde(default)]
    pub start_tool: Vec<String>,

    #[serde(default)]
    pub deploy: Vec<String>,

    #[serde(default)]
    pub debug: Vec<String>,

    #[serde(default)]
    pub rio_log: Vec<String>,

    #[serde(default)]
    pub create_example: Vec<String>,

    #[serde(default)]
    pub create_template: Vec<String>,
}

fn default_monitor_enabled() -> bool {
    true
}

fn default_primary_port() -> u16 {
    crate::endpoint::DEFAULT_PRIMARY_PORT
}

fn default_fallback_port() -> u16 {
    crate::endpoint::DEFAULT_FALLBACK_PORT
}

fn default_attempt_timeout_ms() -> u64 {
    crate::connector::DEFAULT_ATTEMPT_TIMEOUT.as_millis() as u64
}

fn default_retry_delay_ms() -> u64 {
    crate::monitor::DEFAULT_RETRY_DELAY.as_millis() as u64
}

fn default_language_choices() -> Vec<String> {
    vec!["java".to_string(), "cpp".to_string()]
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            enabled: default_monitor_enabled(),
            primary_port: default_primary_port(),
            fallback_port: default_fallback_port(),
            attempt_timeout_ms: default_attempt_timeout_ms(),
            retry_delay_ms: default_retry_delay_ms(),
            hosts: Vec::new(),
        }
    }
}

impl Default for LanguagesConfig {
    fn default() -> Self {
        Self {
            choices: default_language_choices(),
        }
    }
}

impl MonitorConfig {
    pub fn connector_settings(&self) -> ConnectorSettings {
        ConnectorSettings {
            primary_port: self.primary_port,
            fallback_port: self.fallback_port,
            timeout: Duration::from_millis(self.attempt_timeout_ms),
            hosts: self.hosts.clone(),
        }
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl RiolinkConfig {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, RiolinkError> {
        let content = fs::read_to_string(path)
            .map_err(|e| RiolinkError::Config(format!("failed to read config file: {}", e)))?;
        toml::from_str(&content)
            .map_err(|e| RiolinkError::Config(format!("failed to parse config file: {}", e)))
    }

    /// `.wpilib/riolink.toml` under the workspace root
    pub fn project_path(workspace: &Workspace) -> PathBuf {
        workspace.project_dir().join(CONFIG_FILE)
    }

    /// Load configuration from the workspace, defaults when there is no file
    pub fn load_from_project(workspace: &Workspace) -> Result<Self, RiolinkError> {
        let config_path = Self::project_path(workspace);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(RiolinkConfig::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = RiolinkConfig::default();
        assert!(config.monitor.enabled);
        assert_eq!(config.monitor.primary_port, 1741);
        assert_eq!(config.monitor.fallback_port, 9999);
        assert_eq!(config.monitor.retry_delay(), Duration::from_millis(2000));
        assert_eq!(config.languages.choices, vec!["java", "cpp"]);
        assert!(config.actions.deploy.is_empty());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: RiolinkConfig = toml::from_str(
            r#"
[monitor]
attempt_timeout_ms = 500

[actions]
deploy = ["./gradlew", "deploy", "-PteamNumber={team}"]
"#,
        )
        .unwrap();

        let settings = config.monitor.connector_settings();
        assert_eq!(settings.timeout, Duration::from_millis(500));
        assert_eq!(settings.primary_port, 1741);
        assert!(settings.hosts.is_empty());
        assert_eq!(config.actions.deploy.len(), 3);
        assert!(config.actions.debug.is_empty());
        assert_eq!(config.languages.choices.len(), 2);
    }

    #[test]
    fn test_empty_language_list_is_kept() {
        let config: RiolinkConfig = toml::from_str("[languages]\nchoices = []\n").unwrap();
        assert!(config.languages.choices.is_empty());
    }

    #[test]
    fn test_load_from_project() {
        let temp = TempDir::new().unwrap();
        let workspace = Workspace::new(temp.path());
        assert_eq!(
            RiolinkConfig::load_from_project(&workspace).unwrap(),
            RiolinkConfig::default()
        );

        fs::create_dir_all(workspace.project_dir()).unwrap();
        fs::write(
            RiolinkConfig::project_path(&workspace),
            "[monitor]\nenabled = false\n",
        )
        .unwrap();
        let config = RiolinkConfig::load_from_project(&workspace).unwrap();
        assert!(!config.monitor.enabled);

        fs::write(RiolinkConfig::project_path(&workspace), "[monitor\n").unwrap();
        assert!(matches!(
            RiolinkConfig::load_from_project(&workspace),
            Err(RiolinkError::Config(_))
        ));
    }
}
