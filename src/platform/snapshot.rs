//! JSON window snapshots
//!
//! A snapshot file captures what a native backend reported at one point in time:
//!
//! ```json
//! { "platform": "linux-x11", "windows": [ ... ], "workspaces": [ ... ] }
//! ```
//!
//! Windows use the regular wire record, so records written by older tools load too.

use crate::models::{Window, Workspace};
use crate::platform::enumerator::InMemoryEnumerator;
use crate::{DeskScoutError, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub windows: Vec<Window>,
    #[serde(default)]
    pub workspaces: Vec<Workspace>,
}

impl Snapshot {
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|err| {
            DeskScoutError::WindowEnumeration(format!("invalid window snapshot: {}", err)).into()
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read snapshot {}", path.display()))?;
        let snapshot = Self::from_json(&content)?;
        debug!(
            path = %path.display(),
            windows = snapshot.windows.len(),
            workspaces = snapshot.workspaces.len(),
            "Loaded window snapshot"
        );
        Ok(snapshot)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Turn the snapshot into an enumerator serving its contents
    pub fn into_enumerator(self) -> InMemoryEnumerator {
        let platform = self
            .platform
            .unwrap_or_else(|| format!("snapshot ({})", std::env::consts::OS));
        InMemoryEnumerator::new_with(self.windows, self.workspaces).with_platform(platform)
    }
}
