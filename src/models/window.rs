//! Window model for DeskScout
//!
//! A `Window` is a point-in-time snapshot produced by the platform enumerator. Snapshots
//! are never patched in place; the cache replaces the whole list on every refresh.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coordinates beyond this magnitude are treated as bogus positions
const MAX_REASONABLE_COORD: i32 = 100_000;

/// Window state across workspaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum WindowState {
    /// Standard visible window
    #[default]
    Normal,
    /// Iconified window
    Minimized,
    /// Currently active window
    Focused,
    /// Hidden but not minimized (e.g. on a different workspace)
    Hidden,
}

impl fmt::Display for WindowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowState::Normal => write!(f, "Normal"),
            WindowState::Minimized => write!(f, "Minimized"),
            WindowState::Focused => write!(f, "Focused"),
            WindowState::Hidden => write!(f, "Hidden"),
        }
    }
}

/// Snapshot of a single top-level window.
///
/// Field order is the wire order: the legacy fields `handle` through `ownerName` come
/// first and keep their original names and types; workspace and state fields are
/// appended after them. Legacy records without the newer fields still deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Window {
    /// Opaque platform identifier
    pub handle: String,
    pub title: String,
    /// Position may be negative on multi-monitor setups
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub is_visible: bool,
    pub process_id: u32,
    pub owner_name: String,

    #[serde(default)]
    pub workspace_id: String,
    #[serde(default)]
    pub workspace_name: String,
    #[serde(default = "default_on_current_workspace")]
    pub is_on_current_workspace: bool,
    #[serde(default)]
    pub state: WindowState,
    #[serde(default)]
    pub is_focused: bool,
    #[serde(default)]
    pub is_minimized: bool,
}

fn default_on_current_workspace() -> bool {
    true
}

impl Window {
    /// Create a window on the current workspace in the `Normal` state
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        handle: impl Into<String>,
        title: impl Into<String>,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        is_visible: bool,
        process_id: u32,
        owner_name: impl Into<String>,
    ) -> Self {
        Self {
            handle: handle.into(),
            title: title.into(),
            x,
            y,
            width,
            height,
            is_visible,
            process_id,
            owner_name: owner_name.into(),
            workspace_id: String::new(),
            workspace_name: String::new(),
            is_on_current_workspace: true,
            state: WindowState::Normal,
            is_focused: false,
            is_minimized: false,
        }
    }

    /// Attach workspace membership
    pub fn on_workspace(
        mut self,
        workspace_id: impl Into<String>,
        workspace_name: impl Into<String>,
        is_current: bool,
    ) -> Self {
        self.workspace_id = workspace_id.into();
        self.workspace_name = workspace_name.into();
        self.is_on_current_workspace = is_current;
        self
    }

    /// Set the state and keep the focused/minimized flags consistent with it
    pub fn with_state(mut self, state: WindowState) -> Self {
        self.state = state;
        self.is_focused = state == WindowState::Focused;
        self.is_minimized = state == WindowState::Minimized;
        self
    }

    /// Valid iff the handle is non-empty, both dimensions are positive and the
    /// owning process id is non-zero
    pub fn is_valid(&self) -> bool {
        !self.handle.is_empty() && self.has_valid_dimensions() && self.process_id > 0
    }

    pub fn has_valid_dimensions(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    pub fn has_valid_position(&self) -> bool {
        self.x.abs() < MAX_REASONABLE_COORD && self.y.abs() < MAX_REASONABLE_COORD
    }

    pub fn has_workspace_info(&self) -> bool {
        !self.workspace_id.is_empty() || !self.workspace_name.is_empty()
    }

    /// Focusing this window requires leaving the current workspace
    pub fn needs_workspace_switch(&self) -> bool {
        !self.is_on_current_workspace
    }

    /// Serialize to the backward-compatible wire record
    pub fn to_wire(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// One-line rendering: `owner - title [PID: n] [workspace] [state]`
    pub fn short_description(&self) -> String {
        let mut line = self.owner_name.clone();
        if !self.title.is_empty() {
            line.push_str(" - ");
            line.push_str(&self.title);
        }
        line.push_str(&format!(" [PID: {}]", self.process_id));

        if !self.workspace_name.is_empty() {
            line.push_str(&format!(" [{}]", self.workspace_name));
        } else if !self.workspace_id.is_empty() {
            line.push_str(&format!(" [WS: {}]", self.workspace_id));
        }

        if self.is_focused {
            line.push_str(" [Focused]");
        } else if self.is_minimized {
            line.push_str(" [Minimized]");
        } else if !self.is_on_current_workspace {
            line.push_str(" [Other Desktop]");
        }

        line
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.process_id, self.owner_name)?;
        if !self.title.is_empty() {
            write!(f, " - {}", self.title)?;
        }

        if self.has_workspace_info() {
            if self.workspace_name.is_empty() {
                write!(f, "\n    Workspace: ID {}", self.workspace_id)?;
            } else {
                write!(f, "\n    Workspace: {}", self.workspace_name)?;
            }
            if !self.is_on_current_workspace {
                write!(f, " (not current)")?;
            }
        }

        write!(
            f,
            "\n    Position: ({}, {})  Size: {}x{}  State: {}",
            self.x, self.y, self.width, self.height, self.state
        )?;

        if !self.is_visible {
            write!(f, "  [Not Visible]")?;
        }
        Ok(())
    }
}
