//! Focus workflow: validate, optionally switch workspace, focus, record.

use crate::error_recovery::{classify_error, suggestion};
use crate::models::{
    FocusOperation, FocusRequest, FocusStatus, RequestIdGenerator, UuidRequestIds, Window,
};
use crate::platform::WindowEnumerator;
use crate::services::rate_limiter::RateLimiter;
use crate::DeskScoutError;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub const SWITCH_NOT_ALLOWED: &str = "workspace switch required but not allowed";

/// Focus coordinator settings
#[derive(Debug, Clone)]
pub struct FocusConfig {
    /// Upper bound on one handle validation
    pub validation_timeout: Duration,
    /// Completed operations kept, oldest dropped first
    pub history_size: usize,
    /// Focus requests admitted per rate-limit window
    pub rate_limit_max_requests: usize,
    /// Length of the sliding rate-limit window
    pub rate_limit_window: Duration,
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            validation_timeout: Duration::from_millis(500),
            history_size: 1000,
            rate_limit_max_requests: 10,
            rate_limit_window: Duration::from_secs(1),
        }
    }
}

pub struct FocusCoordinator {
    enumerator: Arc<dyn WindowEnumerator>,
    config: FocusConfig,
    rate_limiter: RateLimiter,
    history: Mutex<VecDeque<FocusOperation>>,
    request_ids: Arc<dyn RequestIdGenerator>,
}

impl FocusCoordinator {
    pub fn new(enumerator: Arc<dyn WindowEnumerator>, config: FocusConfig) -> Self {
        Self::with_request_ids(enumerator, config, Arc::new(UuidRequestIds))
    }

    pub fn with_request_ids(
        enumerator: Arc<dyn WindowEnumerator>,
        config: FocusConfig,
        request_ids: Arc<dyn RequestIdGenerator>,
    ) -> Self {
        let rate_limiter =
            RateLimiter::new(config.rate_limit_max_requests, config.rate_limit_window);
        Self {
            enumerator,
            history: Mutex::new(VecDeque::with_capacity(config.history_size.min(64))),
            config,
            rate_limiter,
            request_ids,
        }
    }

    /// Bring the window behind `handle` to the front.
    ///
    /// Returns `false` when rate limited (nothing recorded) or when any step fails
    /// (the failed operation is recorded with its reason).
    pub async fn focus_window(&self, handle: &str, allow_workspace_switch: bool) -> bool {
        if !self.rate_limiter.try_acquire().await {
            warn!(handle, "Focus request rate limited");
            return false;
        }

        let request = FocusRequest::new(handle, self.request_ids.next_id());
        let mut operation = FocusOperation::new(request);
        let succeeded = self
            .run(&mut operation, handle, allow_workspace_switch)
            .await;
        self.finish(operation).await;
        succeeded
    }

    async fn run(
        &self,
        operation: &mut FocusOperation,
        handle: &str,
        allow_workspace_switch: bool,
    ) -> bool {
        operation.transition_to(FocusStatus::Validating);
        if !self
            .validate_with_timeout(handle, self.config.validation_timeout)
            .await
        {
            fail(
                operation,
                DeskScoutError::InvalidHandle {
                    handle: handle.to_string(),
                    reason: "handle is invalid or validation timed out".to_string(),
                },
            );
            return false;
        }

        let window = match self.enumerator.get_window_info(handle) {
            Ok(Some(window)) => window,
            Ok(None) => {
                fail(
                    operation,
                    DeskScoutError::InvalidHandle {
                        handle: handle.to_string(),
                        reason: "window not found".to_string(),
                    },
                );
                return false;
            }
            Err(err) => {
                fail(
                    operation,
                    classify_error(&err, |reason| DeskScoutError::Focus {
                        handle: handle.to_string(),
                        reason,
                    }),
                );
                return false;
            }
        };

        let cross_workspace = window.needs_workspace_switch();
        let source_workspace = self.current_workspace_id();
        operation.replace_request(operation.request.resolved(
            &source_workspace,
            &window.workspace_id,
            cross_workspace,
        ));

        if cross_workspace && !allow_workspace_switch {
            fail(
                operation,
                DeskScoutError::WorkspaceSwitch {
                    source_workspace,
                    target_workspace: window.workspace_id.clone(),
                    reason: SWITCH_NOT_ALLOWED.to_string(),
                    degradable: true,
                },
            );
            return false;
        }

        if cross_workspace {
            operation.transition_to(FocusStatus::SwitchingWorkspace);
            operation.mark_workspace_switched();
            self.switch_workspace(&source_workspace, &window);
        }
        operation.transition_to(FocusStatus::Focusing);

        match self.enumerator.focus_window(handle) {
            Ok(true) => {}
            Ok(false) => {
                fail(
                    operation,
                    DeskScoutError::Focus {
                        handle: handle.to_string(),
                        reason: "platform refused to focus the window".to_string(),
                    },
                );
                return false;
            }
            Err(err) => {
                fail(
                    operation,
                    classify_error(&err, |reason| DeskScoutError::Focus {
                        handle: handle.to_string(),
                        reason,
                    }),
                );
                return false;
            }
        }

        if window.is_minimized {
            operation.transition_to(FocusStatus::Restoring);
            operation.mark_window_restored();
        }
        operation.complete()
    }

    /// Best effort; a failed switch still lets the direct focus go ahead
    fn switch_workspace(&self, source_workspace: &str, window: &Window) {
        if !self.enumerator.can_switch_workspaces() || window.workspace_id.is_empty() {
            debug!(
                handle = %window.handle,
                "Workspace switching unavailable, focusing directly"
            );
            return;
        }

        match self.enumerator.switch_to_workspace(&window.workspace_id) {
            Ok(true) => debug!(
                from = source_workspace,
                to = %window.workspace_id,
                "Switched workspace"
            ),
            Ok(false) => warn!(
                from = source_workspace,
                to = %window.workspace_id,
                "Workspace switch refused, attempting direct focus"
            ),
            Err(err) => warn!(
                from = source_workspace,
                to = %window.workspace_id,
                error = %err,
                "Workspace switch failed, attempting direct focus"
            ),
        }
    }

    fn current_workspace_id(&self) -> String {
        match self.enumerator.get_current_workspace() {
            Ok(Some(workspace)) => workspace.id,
            Ok(None) => String::new(),
            Err(err) => {
                debug!(error = %err, "Current workspace unavailable");
                String::new()
            }
        }
    }

    async fn finish(&self, operation: FocusOperation) {
        if operation.status.is_successful() {
            info!(
                request_id = %operation.request.request_id,
                handle = %operation.request.window_handle,
                cross_workspace = operation.request.cross_workspace,
                duration_ms = operation.duration().as_millis() as u64,
                "Window focused"
            );
            if !operation.meets_performance_requirements() {
                warn!(
                    request_id = %operation.request.request_id,
                    duration_ms = operation.duration().as_millis() as u64,
                    target_ms = operation.performance_target().as_millis() as u64,
                    "Focus exceeded performance target"
                );
            }
        } else {
            warn!(
                request_id = %operation.request.request_id,
                handle = %operation.request.window_handle,
                error = %operation.error_message,
                remediation = operation.remediation.as_deref().unwrap_or(""),
                "Focus failed"
            );
        }

        let mut history = self.history.lock().await;
        history.push_back(operation);
        while history.len() > self.config.history_size {
            history.pop_front();
        }
    }

    /// Validate with the configured timeout
    pub async fn validate_handle(&self, handle: &str) -> bool {
        self.validate_with_timeout(handle, self.config.validation_timeout)
            .await
    }

    /// Ask the platform whether `handle` is live, giving up after `timeout`.
    ///
    /// The platform call runs on the blocking pool. On timeout only the wait is
    /// abandoned; the call itself finishes in the background and its answer is dropped.
    pub async fn validate_with_timeout(&self, handle: &str, timeout: Duration) -> bool {
        if handle.is_empty() {
            return false;
        }

        let enumerator = Arc::clone(&self.enumerator);
        let owned = handle.to_string();
        let task = tokio::task::spawn_blocking(move || enumerator.is_window_valid(&owned));

        match tokio::time::timeout(timeout, task).await {
            Ok(Ok(Ok(valid))) => valid,
            Ok(Ok(Err(err))) => {
                debug!(handle, error = %err, "Handle validation failed");
                false
            }
            Ok(Err(join_err)) => {
                warn!(handle, error = %join_err, "Handle validation task aborted");
                false
            }
            Err(_) => {
                warn!(
                    handle,
                    timeout_ms = timeout.as_millis() as u64,
                    "Handle validation timed out"
                );
                false
            }
        }
    }

    pub async fn history(&self) -> Vec<FocusOperation> {
        self.history.lock().await.iter().cloned().collect()
    }

    pub async fn last_operation(&self) -> Option<FocusOperation> {
        self.history.lock().await.back().cloned()
    }

    pub async fn clear_history(&self) {
        self.history.lock().await.clear();
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }
}

fn fail(operation: &mut FocusOperation, err: DeskScoutError) {
    operation.platform_error_code = err.platform_code();
    operation.remediation = Some(suggestion(&err).to_string());
    operation.fail(err.to_string());
}
