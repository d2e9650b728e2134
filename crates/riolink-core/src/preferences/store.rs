//! In-memory two-tier store backed by a persistence collaborator

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info};

use super::{
    Preference, PreferenceError, PreferenceKey, PreferencePersistence, PreferenceScope,
    PreferenceSet, PreferenceStore, PreferenceValue, resolve,
};
use crate::workspace::Workspace;

#[derive(Debug, Default)]
struct Tiers {
    global: PreferenceSet,
    projects: HashMap<Workspace, PreferenceSet>,
}

/// Two-tier store with write-through persistence
///
/// A write is persisted before it becomes visible, and the whole write runs
/// under the store's write lock: a failed save leaves both tiers untouched,
/// and two writers to the same key are serialized (last write wins).
pub struct ScopedPreferenceStore {
    persistence: Arc<dyn PreferencePersistence>,
    tiers: RwLock<Tiers>,
}

impl ScopedPreferenceStore {
    /// Load the global tier from `persistence`
    pub fn open(persistence: Arc<dyn PreferencePersistence>) -> Result<Self, PreferenceError> {
        let global = persistence.load_global()?;
        Ok(Self {
            persistence,
            tiers: RwLock::new(Tiers {
                global,
                projects: HashMap::new(),
            }),
        })
    }

    /// Store that persists nothing
    pub fn in_memory() -> Self {
        Self {
            persistence: Arc::new(super::NullPersistence),
            tiers: RwLock::new(Tiers::default()),
        }
    }

    /// Make `workspace` known, loading its project tier
    ///
    /// Attaching an already known workspace keeps the in-memory tier.
    pub fn attach(&self, workspace: &Workspace) -> Result<(), PreferenceError> {
        if self.read().projects.contains_key(workspace) {
            return Ok(());
        }
        let project = self.persistence.load_project(workspace)?;
        self.write()
            .projects
            .entry(workspace.clone())
            .or_insert(project);
        info!(workspace = %workspace.root().display(), "workspace preferences attached");
        Ok(())
    }

    fn read(&self) -> RwLockReadGuard<'_, Tiers> {
        self.tiers.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tiers> {
        self.tiers.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy `tier`, change it, save the copy, then swap it in
    fn update(
        &self,
        workspace: &Workspace,
        scope: PreferenceScope,
        change: impl FnOnce(&mut PreferenceSet),
    ) -> Result<(), PreferenceError> {
        let mut tiers = self.write();
        match scope {
            PreferenceScope::Global => {
                let mut next = tiers.global.clone();
                change(&mut next);
                self.persistence.save_global(&next)?;
                tiers.global = next;
            }
            PreferenceScope::Project => {
                let current = tiers
                    .projects
                    .get(workspace)
                    .ok_or_else(|| PreferenceError::UnknownWorkspace(workspace.root().into()))?;
                let mut next = current.clone();
                change(&mut next);
                self.persistence.save_project(workspace, &next)?;
                tiers.projects.insert(workspace.clone(), next);
            }
        }
        Ok(())
    }
}

impl PreferenceStore for ScopedPreferenceStore {
    fn contains(&self, workspace: &Workspace) -> bool {
        self.read().projects.contains_key(workspace)
    }

    fn get(&self, workspace: &Workspace, key: PreferenceKey) -> PreferenceValue {
        let tiers = self.read();
        resolve(key, tiers.projects.get(workspace), &tiers.global)
    }

    fn get_global(&self, key: PreferenceKey) -> PreferenceValue {
        resolve(key, None, &self.read().global)
    }

    fn set(
        &self,
        workspace: &Workspace,
        preference: Preference,
        scope: PreferenceScope,
    ) -> Result<(), PreferenceError> {
        self.update(workspace, scope, |set| set.apply(&preference))?;
        debug!(
            key = %preference.key(),
            scope = %scope,
            workspace = %workspace.root().display(),
            "preference set"
        );
        Ok(())
    }

    fn clear(
        &self,
        workspace: &Workspace,
        key: PreferenceKey,
        scope: PreferenceScope,
    ) -> Result<(), PreferenceError> {
        self.update(workspace, scope, |set| set.remove(key))?;
        debug!(key = %key, scope = %scope, "preference cleared");
        Ok(())
    }
}
