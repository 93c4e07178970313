//! Workspace model for DeskScout
//!
//! Represents a virtual desktop as reported by the platform enumerator

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of the synthetic workspace used when the platform has no desktops
pub const DEFAULT_WORKSPACE_ID: &str = "default";

/// Display name of the synthetic workspace
pub const DEFAULT_WORKSPACE_NAME: &str = "Desktop";

/// A virtual desktop and the handles of the windows it holds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    /// Platform-specific unique identifier
    pub id: String,

    /// Human-readable name
    pub name: String,

    /// Zero-based position in the platform's desktop list
    pub index: usize,

    /// Whether this is the active workspace
    pub is_current: bool,

    /// Handles of windows on this workspace
    #[serde(default)]
    pub window_handles: Vec<String>,
}

impl Workspace {
    pub fn new(id: impl Into<String>, name: impl Into<String>, index: usize, is_current: bool) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            index,
            is_current,
            window_handles: Vec::new(),
        }
    }

    /// The single stand-in workspace for platforms without virtual desktops
    pub fn synthetic_default() -> Self {
        Self::new(DEFAULT_WORKSPACE_ID, DEFAULT_WORKSPACE_NAME, 0, true)
    }

    pub fn with_windows(mut self, handles: Vec<String>) -> Self {
        self.window_handles = handles;
        self
    }

    pub fn is_valid(&self) -> bool {
        !self.id.is_empty() && !self.name.is_empty()
    }

    pub fn window_count(&self) -> usize {
        self.window_handles.len()
    }
}

impl fmt::Display for Workspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Workspace[{}]: {} (ID: {})", self.index, self.name, self.id)?;
        if self.is_current {
            write!(f, " [CURRENT]")?;
        }
        write!(f, " - {} windows", self.window_count())
    }
}

/// Exactly one workspace of a non-empty set is current
pub fn has_single_current(workspaces: &[Workspace]) -> bool {
    !workspaces.is_empty() && workspaces.iter().filter(|ws| ws.is_current).count() == 1
}
