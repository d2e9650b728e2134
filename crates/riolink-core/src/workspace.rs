//! Workspaces and the single entry point for choosing one
//!
//! A `Workspace` is a handle to a project root owned by the host; identity
//! is the root path. Every workspace-scoped command asks
//! [`WorkspaceResolver::resolve`] first: one open workspace is used as-is,
//! several are offered in a selection prompt, and none aborts silently.

use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::interaction::{InteractionAdapter, InteractionError, InteractionResult};
use crate::step::{Absence, Step};

/// Directory that marks a robot project root
pub const PROJECT_DIR: &str = ".wpilib";

/// Handle to a project root
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
    name: String,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| root.display().to_string());
        Self { root, name }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `<root>/.wpilib`
    pub fn project_dir(&self) -> PathBuf {
        self.root.join(PROJECT_DIR)
    }

    /// Whether the root carries a `.wpilib` directory
    pub fn is_robot_project(&self) -> bool {
        self.project_dir().is_dir()
    }

    /// Label used in the selection prompt
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.root.display())
    }
}

impl PartialEq for Workspace {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root
    }
}

impl Eq for Workspace {}

impl Hash for Workspace {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.root.hash(state);
    }
}

/// Find the robot project containing `start` by searching upward for `.wpilib/`
pub fn find_project_root_from(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);
    while let Some(dir) = current {
        if dir.join(PROJECT_DIR).is_dir() {
            return Some(dir.to_path_buf());
        }
        current = dir.parent();
    }
    None
}

/// Source of the currently open workspaces
pub trait WorkspaceHost: Send + Sync {
    fn open_workspaces(&self) -> Vec<Workspace>;
}

impl WorkspaceHost for Vec<Workspace> {
    fn open_workspaces(&self) -> Vec<Workspace> {
        self.clone()
    }
}

/// Picks the workspace a command operates on
pub struct WorkspaceResolver {
    interaction: Arc<dyn InteractionAdapter>,
}

impl WorkspaceResolver {
    pub fn new(interaction: Arc<dyn InteractionAdapter>) -> Self {
        Self { interaction }
    }

    /// Zero open: absent; one: that one; several: ask
    pub async fn resolve(&self, open: &[Workspace]) -> InteractionResult<Step<Workspace>> {
        match open {
            [] => Ok(Step::Absent(Absence::NoWorkspace)),
            [only] => Ok(Step::Value(only.clone())),
            many => {
                let labels: Vec<String> = many.iter().map(Workspace::label).collect();
                match self
                    .interaction
                    .ask_select("Select a workspace", &labels)
                    .await
                {
                    Ok(index) => many.get(index).cloned().map(Step::Value).ok_or_else(|| {
                        InteractionError::InvalidInput(format!(
                            "workspace index {} out of range",
                            index
                        ))
                    }),
                    Err(InteractionError::Cancelled) => Ok(Step::Absent(Absence::Cancelled)),
                    Err(e) => Err(e),
                }
            }
        }
    }
}
