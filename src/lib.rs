//! DeskScout - cached, searchable view of desktop windows and virtual desktops
//!
//! DeskScout keeps a time-bounded cache of the windows and workspaces reported by a
//! platform enumerator, answers keyword and field searches over it, and drives the
//! staged "bring this window to front" workflow, switching virtual desktops when
//! the target lives elsewhere.

pub mod cli;
pub mod compat;
pub mod config;
pub mod error_recovery;
pub mod logging;
pub mod models;
pub mod platform;
pub mod services;

pub use models::*;
pub use services::*;

/// Result type alias for DeskScout operations
pub type Result<T> = anyhow::Result<T>;

/// Error taxonomy for DeskScout operations.
///
/// Every platform failure that crosses the enumerator boundary is converted into one
/// of these variants; `error_recovery` maps each variant to a severity and a fallback
/// strategy.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DeskScoutError {
    #[error("Platform not supported: {0}")]
    PlatformNotSupported(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Window enumeration failed: {0}")]
    WindowEnumeration(String),

    #[error("Window operation '{operation}' failed: {details}")]
    WindowOperation { operation: String, details: String },

    #[error("Platform API call failed: {api} (error code: {code}){}", format_details(.details))]
    PlatformApi {
        api: String,
        code: i32,
        details: String,
    },

    #[error("Filter operation failed: {0}")]
    Filter(String),

    #[error("Configuration error for parameter '{parameter}': {issue}")]
    Configuration { parameter: String, issue: String },

    #[error("Workspace operation failed: {details}{}", degrade_suffix(.degradable))]
    Workspace { details: String, degradable: bool },

    #[error("Invalid window handle: '{handle}'{}", format_details(.reason))]
    InvalidHandle { handle: String, reason: String },

    #[error("Failed to switch workspace from '{source_workspace}' to '{target_workspace}'{}", format_details(.reason))]
    WorkspaceSwitch {
        source_workspace: String,
        target_workspace: String,
        reason: String,
        degradable: bool,
    },

    #[error("Failed to focus window with handle '{handle}'{}", format_details(.reason))]
    Focus { handle: String, reason: String },

    #[error("Performance warning for '{operation}': took {actual_ms}ms (target: {target_ms}ms)")]
    PerformanceWarning {
        operation: String,
        actual_ms: u64,
        target_ms: u64,
    },
}

impl DeskScoutError {
    /// Numeric platform code carried by the error, if any
    pub fn platform_code(&self) -> Option<i32> {
        match self {
            DeskScoutError::PlatformApi { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Whether a workspace-level failure still allows a simpler fallback
    pub fn is_degradable(&self) -> Option<bool> {
        match self {
            DeskScoutError::Workspace { degradable, .. }
            | DeskScoutError::WorkspaceSwitch { degradable, .. } => Some(*degradable),
            _ => None,
        }
    }
}

fn format_details(details: &str) -> String {
    if details.is_empty() {
        String::new()
    } else {
        format!(" - {}", details)
    }
}

fn degrade_suffix(degradable: &bool) -> &'static str {
    if *degradable {
        " (graceful fallback available)"
    } else {
        " (critical failure)"
    }
}
