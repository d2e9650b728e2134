//! Scoped preferences
//!
//! Every setting lives in one of two tiers:
//!
//! - **Project**: stored with the workspace, wins when present
//! - **Global**: process-wide, used by every workspace without an override
//!
//! Reads fall through `PRECEDENCE` and end at the key's built-in default, so
//! a read never fails. Writes name exactly one scope. The fall-through is the
//! pure function [`resolve`]; [`ScopedPreferenceStore`] layers locking and
//! persistence on top of it.

mod persist;
mod store;

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::connector::TeamSource;
use crate::endpoint::TeamNumber;
use crate::workspace::Workspace;

pub use persist::{NullPersistence, PreferencePersistence, TomlPersistence};
pub use store::ScopedPreferenceStore;

/// Language used before one is picked
pub const DEFAULT_LANGUAGE: &str = "none";

/// Error type for preference storage
#[derive(Error, Debug)]
pub enum PreferenceError {
    /// Preferences file could not be read or written
    #[error("preferences IO error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Preferences file is not valid TOML for a preference set
    #[error("failed to parse preferences at {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    /// Preference set could not be serialized
    #[error("failed to serialize preferences: {0}")]
    Serialize(String),

    /// A project-scope write named a workspace the store does not know
    #[error("no preferences for workspace {}", .0.display())]
    UnknownWorkspace(PathBuf),
}

/// Storage tier of a preference value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreferenceScope {
    Global,
    Project,
}

impl PreferenceScope {
    /// Label shown in the scope prompt
    pub fn label(&self) -> &'static str {
        match self {
            PreferenceScope::Global => "Globally",
            PreferenceScope::Project => "Project",
        }
    }
}

impl fmt::Display for PreferenceScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreferenceScope::Global => write!(f, "global"),
            PreferenceScope::Project => write!(f, "project"),
        }
    }
}

/// Lookup order for reads, most specific first
pub const PRECEDENCE: [PreferenceScope; 2] = [PreferenceScope::Project, PreferenceScope::Global];

/// Named settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreferenceKey {
    TeamNumber,
    CurrentLanguage,
    AutoSaveOnDeploy,
    AutoStartRioLog,
}

impl PreferenceKey {
    pub const ALL: [PreferenceKey; 4] = [
        PreferenceKey::TeamNumber,
        PreferenceKey::CurrentLanguage,
        PreferenceKey::AutoSaveOnDeploy,
        PreferenceKey::AutoStartRioLog,
    ];

    /// Name as it appears in preference files
    pub fn name(&self) -> &'static str {
        match self {
            PreferenceKey::TeamNumber => "teamNumber",
            PreferenceKey::CurrentLanguage => "currentLanguage",
            PreferenceKey::AutoSaveOnDeploy => "autoSaveOnDeploy",
            PreferenceKey::AutoStartRioLog => "autoStartRioLog",
        }
    }

    /// Value used when neither scope has one
    pub fn default_value(&self) -> PreferenceValue {
        match self {
            PreferenceKey::TeamNumber => PreferenceValue::Team(None),
            PreferenceKey::CurrentLanguage => PreferenceValue::Text(DEFAULT_LANGUAGE.to_string()),
            PreferenceKey::AutoSaveOnDeploy => PreferenceValue::Flag(true),
            PreferenceKey::AutoStartRioLog => PreferenceValue::Flag(true),
        }
    }
}

impl fmt::Display for PreferenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A resolved value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreferenceValue {
    /// `None` means no team is configured
    Team(Option<TeamNumber>),
    Text(String),
    Flag(bool),
}

impl PreferenceValue {
    pub fn as_team(&self) -> Option<TeamNumber> {
        match self {
            PreferenceValue::Team(team) => *team,
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            PreferenceValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            PreferenceValue::Flag(flag) => Some(*flag),
            _ => None,
        }
    }
}

/// A key together with the value to write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preference {
    TeamNumber(TeamNumber),
    CurrentLanguage(String),
    AutoSaveOnDeploy(bool),
    AutoStartRioLog(bool),
}

impl Preference {
    pub fn key(&self) -> PreferenceKey {
        match self {
            Preference::TeamNumber(_) => PreferenceKey::TeamNumber,
            Preference::CurrentLanguage(_) => PreferenceKey::CurrentLanguage,
            Preference::AutoSaveOnDeploy(_) => PreferenceKey::AutoSaveOnDeploy,
            Preference::AutoStartRioLog(_) => PreferenceKey::AutoStartRioLog,
        }
    }

    pub fn value(&self) -> PreferenceValue {
        match self {
            Preference::TeamNumber(team) => PreferenceValue::Team(Some(*team)),
            Preference::CurrentLanguage(lang) => PreferenceValue::Text(lang.clone()),
            Preference::AutoSaveOnDeploy(flag) | Preference::AutoStartRioLog(flag) => {
                PreferenceValue::Flag(*flag)
            }
        }
    }
}

/// One tier's values; absent fields fall through to the next tier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PreferenceSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_number: Option<TeamNumber>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_save_on_deploy: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_start_rio_log: Option<bool>,
}

impl PreferenceSet {
    /// Value stored in this tier, if any
    pub fn value(&self, key: PreferenceKey) -> Option<PreferenceValue> {
        match key {
            PreferenceKey::TeamNumber => self.team_number.map(|t| PreferenceValue::Team(Some(t))),
            PreferenceKey::CurrentLanguage => {
                self.current_language.clone().map(PreferenceValue::Text)
            }
            PreferenceKey::AutoSaveOnDeploy => self.auto_save_on_deploy.map(PreferenceValue::Flag),
            PreferenceKey::AutoStartRioLog => self.auto_start_rio_log.map(PreferenceValue::Flag),
        }
    }

    pub fn apply(&mut self, preference: &Preference) {
        match preference {
            Preference::TeamNumber(team) => self.team_number = Some(*team),
            Preference::CurrentLanguage(lang) => self.current_language = Some(lang.clone()),
            Preference::AutoSaveOnDeploy(flag) => self.auto_save_on_deploy = Some(*flag),
            Preference::AutoStartRioLog(flag) => self.auto_start_rio_log = Some(*flag),
        }
    }

    pub fn remove(&mut self, key: PreferenceKey) {
        match key {
            PreferenceKey::TeamNumber => self.team_number = None,
            PreferenceKey::CurrentLanguage => self.current_language = None,
            PreferenceKey::AutoSaveOnDeploy => self.auto_save_on_deploy = None,
            PreferenceKey::AutoStartRioLog => self.auto_start_rio_log = None,
        }
    }

    pub fn is_empty(&self) -> bool {
        PreferenceKey::ALL.iter().all(|key| self.value(*key).is_none())
    }
}

/// Resolve one key: first tier in `PRECEDENCE` that has it, else the default
pub fn resolve(
    key: PreferenceKey,
    project: Option<&PreferenceSet>,
    global: &PreferenceSet,
) -> PreferenceValue {
    PRECEDENCE
        .iter()
        .find_map(|scope| match scope {
            PreferenceScope::Project => project.and_then(|set| set.value(key)),
            PreferenceScope::Global => global.value(key),
        })
        .unwrap_or_else(|| key.default_value())
}

/// All keys resolved for one workspace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPreferences {
    pub team_number: Option<TeamNumber>,
    pub current_language: String,
    pub auto_save_on_deploy: bool,
    pub auto_start_rio_log: bool,
}

impl ResolvedPreferences {
    /// Build from any per-key lookup
    pub fn from_lookup(lookup: impl Fn(PreferenceKey) -> PreferenceValue) -> Self {
        let flag = |key: PreferenceKey| {
            lookup(key)
                .as_flag()
                .or_else(|| key.default_value().as_flag())
                .unwrap_or(false)
        };
        Self {
            team_number: lookup(PreferenceKey::TeamNumber).as_team(),
            current_language: lookup(PreferenceKey::CurrentLanguage)
                .as_text()
                .unwrap_or(DEFAULT_LANGUAGE)
                .to_string(),
            auto_save_on_deploy: flag(PreferenceKey::AutoSaveOnDeploy),
            auto_start_rio_log: flag(PreferenceKey::AutoStartRioLog),
        }
    }
}

/// Per-workspace, two-tier preference access used by command flows
pub trait PreferenceStore: Send + Sync {
    /// Whether preferences can be located for `workspace`
    fn contains(&self, workspace: &Workspace) -> bool;

    /// Resolved value for `workspace`; never fails
    fn get(&self, workspace: &Workspace, key: PreferenceKey) -> PreferenceValue;

    /// Global value or default, for callers with no workspace
    fn get_global(&self, key: PreferenceKey) -> PreferenceValue;

    /// Write `preference` at exactly `scope`
    fn set(
        &self,
        workspace: &Workspace,
        preference: Preference,
        scope: PreferenceScope,
    ) -> Result<(), PreferenceError>;

    /// Remove `key` from `scope` so reads fall through to the next tier
    fn clear(
        &self,
        workspace: &Workspace,
        key: PreferenceKey,
        scope: PreferenceScope,
    ) -> Result<(), PreferenceError>;

    fn resolved(&self, workspace: &Workspace) -> ResolvedPreferences {
        ResolvedPreferences::from_lookup(|key| self.get(workspace, key))
    }
}

/// Team number as configured in the store, for the connector
pub struct PreferenceTeamSource<S: ?Sized> {
    store: std::sync::Arc<S>,
    workspace: Option<Workspace>,
}

impl<S: PreferenceStore + ?Sized> PreferenceTeamSource<S> {
    /// Read through `workspace`, or the global tier when there is none
    pub fn new(store: std::sync::Arc<S>, workspace: Option<Workspace>) -> Self {
        Self { store, workspace }
    }
}

impl<S: PreferenceStore + ?Sized> TeamSource for PreferenceTeamSource<S> {
    fn team_number(&self) -> Option<TeamNumber> {
        let value = match &self.workspace {
            Some(workspace) => self.store.get(workspace, PreferenceKey::TeamNumber),
            None => self.store.get_global(PreferenceKey::TeamNumber),
        };
        value.as_team()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(n: u32) -> TeamNumber {
        TeamNumber::new(n).unwrap()
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let global = PreferenceSet::default();
        assert_eq!(
            resolve(PreferenceKey::TeamNumber, None, &global),
            PreferenceValue::Team(None)
        );
        assert_eq!(
            resolve(PreferenceKey::CurrentLanguage, None, &global),
            PreferenceValue::Text("none".to_string())
        );
        assert_eq!(
            resolve(PreferenceKey::AutoSaveOnDeploy, None, &global),
            PreferenceValue::Flag(true)
        );
        assert_eq!(
            resolve(PreferenceKey::AutoStartRioLog, None, &global),
            PreferenceValue::Flag(true)
        );
    }

    #[test]
    fn test_project_overrides_global() {
        let mut global = PreferenceSet::default();
        global.apply(&Preference::TeamNumber(team(254)));

        let mut project = PreferenceSet::default();
        assert_eq!(
            resolve(PreferenceKey::TeamNumber, Some(&project), &global).as_team(),
            Some(team(254))
        );

        project.apply(&Preference::TeamNumber(team(1741)));
        assert_eq!(
            resolve(PreferenceKey::TeamNumber, Some(&project), &global).as_team(),
            Some(team(1741))
        );

        project.remove(PreferenceKey::TeamNumber);
        assert_eq!(
            resolve(PreferenceKey::TeamNumber, Some(&project), &global).as_team(),
            Some(team(254))
        );
    }

    #[test]
    fn test_false_project_flag_beats_true_global() {
        let mut global = PreferenceSet::default();
        global.apply(&Preference::AutoSaveOnDeploy(true));
        let mut project = PreferenceSet::default();
        project.apply(&Preference::AutoSaveOnDeploy(false));

        assert_eq!(
            resolve(PreferenceKey::AutoSaveOnDeploy, Some(&project), &global),
            PreferenceValue::Flag(false)
        );
    }

    #[test]
    fn test_preference_key_and_value() {
        let pref = Preference::CurrentLanguage("java".into());
        assert_eq!(pref.key(), PreferenceKey::CurrentLanguage);
        assert_eq!(pref.value().as_text(), Some("java"));
        assert_eq!(
            Preference::AutoStartRioLog(false).value(),
            PreferenceValue::Flag(false)
        );
    }

    #[test]
    fn test_set_serializes_camel_case_and_skips_unset() {
        let mut set = PreferenceSet::default();
        assert!(set.is_empty());
        set.apply(&Preference::TeamNumber(team(1741)));
        set.apply(&Preference::AutoStartRioLog(false));

        let text = toml::to_string(&set).unwrap();
        assert!(text.contains("teamNumber = 1741"));
        assert!(text.contains("autoStartRioLog = false"));
        assert!(!text.contains("currentLanguage"));

        let parsed: PreferenceSet = toml::from_str(&text).unwrap();
        assert_eq!(parsed, set);
    }

    #[test]
    fn test_out_of_range_team_in_file_is_rejected() {
        let result: Result<PreferenceSet, _> = toml::from_str("teamNumber = 30000\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_resolved_from_lookup() {
        let mut global = PreferenceSet::default();
        global.apply(&Preference::CurrentLanguage("cpp".into()));
        let resolved = ResolvedPreferences::from_lookup(|key| resolve(key, None, &global));
        assert_eq!(resolved.current_language, "cpp");
        assert_eq!(resolved.team_number, None);
        assert!(resolved.auto_save_on_deploy);
        assert!(resolved.auto_start_rio_log);
    }

    #[test]
    fn test_scope_labels() {
        assert_eq!(PreferenceScope::Global.label(), "Globally");
        assert_eq!(PreferenceScope::Project.label(), "Project");
        assert_eq!(PRECEDENCE[0], PreferenceScope::Project);
    }
}
