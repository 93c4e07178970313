//! Focus request and operation models
//!
//! A `FocusOperation` walks through the states below; the coordinator drives it and
//! appends it to the history once it reaches a terminal state.
//!
//! ```text
//! Pending -> Validating -> [SwitchingWorkspace] -> Focusing -> [Restoring] -> Completed
//!                                                                           | Failed
//!                                                                           | Cancelled
//! ```

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Target latency for focusing a window on the current workspace
pub const SAME_WORKSPACE_TARGET: Duration = Duration::from_secs(1);

/// Target latency when a workspace switch is involved
pub const CROSS_WORKSPACE_TARGET: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FocusStatus {
    Pending,
    Validating,
    SwitchingWorkspace,
    Focusing,
    Restoring,
    Completed,
    Failed,
    Cancelled,
}

impl FocusStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            FocusStatus::Completed | FocusStatus::Failed | FocusStatus::Cancelled
        )
    }

    pub fn is_successful(self) -> bool {
        self == FocusStatus::Completed
    }

    pub fn is_failure(self) -> bool {
        matches!(self, FocusStatus::Failed | FocusStatus::Cancelled)
    }

    pub fn is_active(self) -> bool {
        !self.is_terminal()
    }

    /// The default successor on the happy path; terminal states map to themselves
    pub fn next_status(self) -> FocusStatus {
        match self {
            FocusStatus::Pending => FocusStatus::Validating,
            FocusStatus::Validating => FocusStatus::Focusing,
            FocusStatus::SwitchingWorkspace => FocusStatus::Focusing,
            FocusStatus::Focusing => FocusStatus::Completed,
            FocusStatus::Restoring => FocusStatus::Completed,
            terminal => terminal,
        }
    }

    pub fn can_transition_to(self, next: FocusStatus) -> bool {
        use FocusStatus::*;

        if self.is_terminal() {
            return false;
        }
        if matches!(next, Failed | Cancelled) {
            return true;
        }
        matches!(
            (self, next),
            (Pending, Validating)
                | (Validating, SwitchingWorkspace)
                | (Validating, Focusing)
                | (SwitchingWorkspace, Focusing)
                | (Focusing, Restoring)
                | (Focusing, Completed)
                | (Restoring, Completed)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FocusStatus::Pending => "PENDING",
            FocusStatus::Validating => "VALIDATING",
            FocusStatus::SwitchingWorkspace => "SWITCHING_WORKSPACE",
            FocusStatus::Focusing => "FOCUSING",
            FocusStatus::Restoring => "RESTORING",
            FocusStatus::Completed => "COMPLETED",
            FocusStatus::Failed => "FAILED",
            FocusStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for FocusStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FocusStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Ok(FocusStatus::Pending),
            "VALIDATING" => Ok(FocusStatus::Validating),
            "SWITCHING_WORKSPACE" => Ok(FocusStatus::SwitchingWorkspace),
            "FOCUSING" => Ok(FocusStatus::Focusing),
            "RESTORING" => Ok(FocusStatus::Restoring),
            "COMPLETED" => Ok(FocusStatus::Completed),
            "FAILED" => Ok(FocusStatus::Failed),
            "CANCELLED" => Ok(FocusStatus::Cancelled),
            other => Err(format!("Unknown focus status: {}", other)),
        }
    }
}

/// Source of unique focus request identifiers
pub trait RequestIdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

/// Random v4 UUID identifiers
#[derive(Debug, Default)]
pub struct UuidRequestIds;

impl RequestIdGenerator for UuidRequestIds {
    fn next_id(&self) -> String {
        format!("focus-{}", Uuid::new_v4())
    }
}

/// Monotonic counter identifiers, starting at 1
#[derive(Debug, Default)]
pub struct SequentialRequestIds {
    counter: AtomicU64,
}

impl SequentialRequestIds {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RequestIdGenerator for SequentialRequestIds {
    fn next_id(&self) -> String {
        let id = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("focus-{}", id)
    }
}

/// An immutable request to bring one window to the front
#[derive(Debug, Clone, PartialEq)]
pub struct FocusRequest {
    /// Target window
    pub window_handle: String,
    /// Unique id from the injected generator
    pub request_id: String,
    /// Target lives on a workspace other than the current one
    pub cross_workspace: bool,
    /// Workspace that was current when the request started
    pub source_workspace_id: String,
    /// Workspace holding the target window
    pub target_workspace_id: String,
    pub created_at: DateTime<Utc>,
}

impl FocusRequest {
    pub fn new(window_handle: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self {
            window_handle: window_handle.into(),
            request_id: request_id.into(),
            cross_workspace: false,
            source_workspace_id: String::new(),
            target_workspace_id: String::new(),
            created_at: Utc::now(),
        }
    }

    /// A copy of this request resolved against its target's workspace
    pub fn resolved(&self, source_workspace_id: &str, target_workspace_id: &str, cross_workspace: bool) -> Self {
        Self {
            window_handle: self.window_handle.clone(),
            request_id: self.request_id.clone(),
            cross_workspace,
            source_workspace_id: source_workspace_id.to_string(),
            target_workspace_id: target_workspace_id.to_string(),
            created_at: self.created_at,
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.window_handle.is_empty() && !self.request_id.is_empty()
    }
}

/// One focus attempt and its progress through the state machine
#[derive(Debug, Clone)]
pub struct FocusOperation {
    pub request: FocusRequest,
    /// Current state in the focus workflow
    pub status: FocusStatus,
    pub started_at: Instant,
    /// Set once the operation reaches a terminal state
    pub finished_at: Option<Instant>,
    /// A workspace switch was attempted
    pub workspace_switched: bool,
    /// The target was minimized and got restored
    pub window_restored: bool,
    /// Empty unless the operation failed
    pub error_message: String,
    /// Native error code when the platform reported one
    pub platform_error_code: Option<i32>,
    /// User-facing hint for resolving the failure
    pub remediation: Option<String>,
}

impl FocusOperation {
    pub fn new(request: FocusRequest) -> Self {
        Self {
            request,
            status: FocusStatus::Pending,
            started_at: Instant::now(),
            finished_at: None,
            workspace_switched: false,
            window_restored: false,
            error_message: String::new(),
            platform_error_code: None,
            remediation: None,
        }
    }

    /// Move to `next` if the state machine allows it. Terminal states stamp the end time.
    pub fn transition_to(&mut self, next: FocusStatus) -> bool {
        if !self.status.can_transition_to(next) {
            tracing::debug!(
                request_id = %self.request.request_id,
                from = %self.status,
                to = %next,
                "Rejected focus state transition"
            );
            return false;
        }
        self.status = next;
        if next.is_terminal() {
            self.finished_at = Some(Instant::now());
        }
        true
    }

    pub fn complete(&mut self) -> bool {
        self.transition_to(FocusStatus::Completed)
    }

    pub fn fail(&mut self, message: impl Into<String>) -> bool {
        self.error_message = message.into();
        self.transition_to(FocusStatus::Failed)
    }

    pub fn cancel(&mut self, reason: impl Into<String>) -> bool {
        self.error_message = reason.into();
        self.transition_to(FocusStatus::Cancelled)
    }

    pub fn mark_workspace_switched(&mut self) {
        self.workspace_switched = true;
    }

    pub fn mark_window_restored(&mut self) {
        self.window_restored = true;
    }

    pub fn replace_request(&mut self, request: FocusRequest) {
        self.request = request;
    }

    pub fn is_complete(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn has_error(&self) -> bool {
        !self.error_message.is_empty() || self.status.is_failure()
    }

    /// Elapsed time until the terminal state, or until now while still active
    pub fn duration(&self) -> Duration {
        match self.finished_at {
            Some(end) => end.duration_since(self.started_at),
            None => self.started_at.elapsed(),
        }
    }

    pub fn performance_target(&self) -> Duration {
        if self.request.cross_workspace {
            CROSS_WORKSPACE_TARGET
        } else {
            SAME_WORKSPACE_TARGET
        }
    }

    pub fn meets_performance_requirements(&self) -> bool {
        self.duration() < self.performance_target()
    }

    pub fn to_json(&self) -> Value {
        let mut value = json!({
            "requestId": self.request.request_id,
            "windowHandle": self.request.window_handle,
            "status": self.status.to_string(),
            "crossWorkspace": self.request.cross_workspace,
            "sourceWorkspaceId": self.request.source_workspace_id,
            "targetWorkspaceId": self.request.target_workspace_id,
            "workspaceSwitched": self.workspace_switched,
            "windowRestored": self.window_restored,
            "durationMs": self.duration().as_millis() as u64,
            "meetsPerformanceTarget": self.meets_performance_requirements(),
            "createdAt": self.request.created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        });

        if !self.error_message.is_empty() {
            value["errorMessage"] = json!(self.error_message);
        }
        if let Some(code) = self.platform_error_code {
            value["platformErrorCode"] = json!(code);
        }
        if let Some(hint) = &self.remediation {
            value["remediation"] = json!(hint);
        }
        value
    }
}

impl fmt::Display for FocusOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {} ({}ms)",
            self.request.request_id,
            self.request.window_handle,
            self.status,
            self.duration().as_millis()
        )?;
        if !self.error_message.is_empty() {
            write!(f, ": {}", self.error_message)?;
        }
        Ok(())
    }
}
