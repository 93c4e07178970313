//! Error classification and recovery policy
//!
//! Maps every [`DeskScoutError`] onto a severity and a fallback strategy, turns
//! arbitrary platform failures into taxonomy errors, and collects soft issues from
//! batch operations without aborting them.

use crate::DeskScoutError;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{error, info, warn};

/// How bad an error is for the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ErrorSeverity {
    /// Performance or informational issue; the operation still succeeded
    Warning,
    /// The operation failed but a fallback exists
    Recoverable,
    /// Nothing sensible can be done on this host
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorSeverity::Warning => write!(f, "WARNING"),
            ErrorSeverity::Recoverable => write!(f, "RECOVERABLE"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Fallback to apply after a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RecoveryStrategy {
    /// Hand back an empty result
    ReturnEmpty,
    /// Serve the last cached data
    UseCache,
    /// Serve whatever subset of data is still reachable
    UseLimitedData,
    /// Retry through a less demanding code path
    RetryWithSimpler,
}

impl RecoveryStrategy {
    pub fn description(self) -> &'static str {
        match self {
            RecoveryStrategy::ReturnEmpty => "return an empty result",
            RecoveryStrategy::UseCache => "serve cached data",
            RecoveryStrategy::UseLimitedData => "continue with limited data",
            RecoveryStrategy::RetryWithSimpler => "retry with a simpler operation",
        }
    }
}

pub fn assess_severity(err: &DeskScoutError) -> ErrorSeverity {
    match err {
        DeskScoutError::PlatformNotSupported(_) => ErrorSeverity::Critical,
        DeskScoutError::Workspace { degradable, .. }
        | DeskScoutError::WorkspaceSwitch { degradable, .. } => {
            if *degradable {
                ErrorSeverity::Recoverable
            } else {
                ErrorSeverity::Critical
            }
        }
        DeskScoutError::PerformanceWarning { .. } => ErrorSeverity::Warning,
        DeskScoutError::PermissionDenied(_)
        | DeskScoutError::WindowEnumeration(_)
        | DeskScoutError::WindowOperation { .. }
        | DeskScoutError::PlatformApi { .. }
        | DeskScoutError::Filter(_)
        | DeskScoutError::Configuration { .. }
        | DeskScoutError::InvalidHandle { .. }
        | DeskScoutError::Focus { .. } => ErrorSeverity::Recoverable,
    }
}

pub fn recommend_strategy(err: &DeskScoutError) -> RecoveryStrategy {
    match err {
        DeskScoutError::PermissionDenied(_) => RecoveryStrategy::UseLimitedData,
        DeskScoutError::Workspace { .. } => RecoveryStrategy::RetryWithSimpler,
        DeskScoutError::PerformanceWarning { .. } => RecoveryStrategy::UseCache,
        DeskScoutError::WindowEnumeration(_) => RecoveryStrategy::UseCache,
        DeskScoutError::InvalidHandle { .. } => RecoveryStrategy::ReturnEmpty,
        DeskScoutError::Focus { .. } | DeskScoutError::WorkspaceSwitch { .. } => {
            RecoveryStrategy::RetryWithSimpler
        }
        DeskScoutError::PlatformNotSupported(_)
        | DeskScoutError::WindowOperation { .. }
        | DeskScoutError::PlatformApi { .. }
        | DeskScoutError::Filter(_)
        | DeskScoutError::Configuration { .. } => RecoveryStrategy::ReturnEmpty,
    }
}

pub fn can_recover(err: &DeskScoutError) -> bool {
    assess_severity(err) != ErrorSeverity::Critical
}

/// Map any failure onto the taxonomy.
///
/// Taxonomy errors anywhere in the chain pass through unchanged. Other errors are
/// classified by message, and whatever remains is wrapped by `fallback`.
pub fn classify_error<F>(err: &anyhow::Error, fallback: F) -> DeskScoutError
where
    F: FnOnce(String) -> DeskScoutError,
{
    if let Some(known) = err.chain().find_map(|cause| cause.downcast_ref::<DeskScoutError>()) {
        return known.clone();
    }

    let message = format!("{:#}", err);
    let lowered = message.to_lowercase();
    if lowered.contains("permission") || lowered.contains("access denied") {
        DeskScoutError::PermissionDenied(message)
    } else if lowered.contains("not supported") || lowered.contains("unsupported") {
        DeskScoutError::PlatformNotSupported(message)
    } else if lowered.contains("timed out") || lowered.contains("timeout") {
        DeskScoutError::WindowOperation {
            operation: "platform call".to_string(),
            details: message,
        }
    } else {
        fallback(message)
    }
}

/// Remediation hint shown next to a failure
pub fn suggestion(err: &DeskScoutError) -> &'static str {
    match err {
        DeskScoutError::PlatformNotSupported(_) => {
            "run on a supported desktop platform or provide a window snapshot"
        }
        DeskScoutError::PermissionDenied(_) => "grant accessibility permissions and retry",
        DeskScoutError::WindowEnumeration(_) => "retry; cached results are used meanwhile",
        DeskScoutError::WindowOperation { .. } => "check that the window still exists and retry",
        DeskScoutError::PlatformApi { .. } => "check the platform error code and retry",
        DeskScoutError::Filter(_) => "simplify the search query",
        DeskScoutError::Configuration { .. } => "fix the configuration value and restart",
        DeskScoutError::Workspace { .. } => "retry without workspace information",
        DeskScoutError::InvalidHandle { .. } => "list windows again to get a current handle",
        DeskScoutError::WorkspaceSwitch { .. } => {
            "switch to the target workspace manually, then focus again"
        }
        DeskScoutError::Focus { .. } => "make sure the window is not blocked by a modal dialog",
        DeskScoutError::PerformanceWarning { .. } => "enable caching or narrow the query",
    }
}

pub fn error_summary(err: &DeskScoutError) -> String {
    format!("[{}] {}", assess_severity(err), err)
}

/// Process exit code for a failure that ends the program
pub fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<DeskScoutError>() {
        Some(DeskScoutError::PlatformNotSupported(_)) => 2,
        Some(DeskScoutError::PermissionDenied(_)) => 3,
        Some(DeskScoutError::WindowEnumeration(_)) => 4,
        Some(_) => 5,
        None => 99,
    }
}

/// Where and when an error happened
#[derive(Debug, Clone, Serialize)]
pub struct ErrorContext {
    pub operation: String,
    pub component: String,
    pub platform: String,
    pub timestamp: DateTime<Utc>,
    pub additional_info: BTreeMap<String, String>,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>, component: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            component: component.into(),
            platform: std::env::consts::OS.to_string(),
            timestamp: Utc::now(),
            additional_info: BTreeMap::new(),
        }
    }

    pub fn with_info(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.additional_info.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} in {} on {} at {}",
            self.operation,
            self.component,
            self.platform,
            self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
        )?;
        for (key, value) in &self.additional_info {
            write!(f, " {}={}", key, value)?;
        }
        Ok(())
    }
}

/// Log an error at the level its severity calls for
pub fn report(err: &DeskScoutError, context: &ErrorContext) {
    let strategy = recommend_strategy(err);
    match assess_severity(err) {
        ErrorSeverity::Critical => error!(
            operation = %context.operation,
            component = %context.component,
            "{}", error_summary(err)
        ),
        ErrorSeverity::Recoverable => warn!(
            operation = %context.operation,
            component = %context.component,
            strategy = strategy.description(),
            "{}", error_summary(err)
        ),
        ErrorSeverity::Warning => info!(
            operation = %context.operation,
            component = %context.component,
            "{}", error_summary(err)
        ),
    }
}

/// Issue recorded by an [`ErrorAggregator`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregatedIssue {
    pub message: String,
    pub component: String,
}

/// Collects warnings and errors from one batch operation
#[derive(Debug, Clone, Default, Serialize)]
pub struct ErrorAggregator {
    warnings: Vec<AggregatedIssue>,
    errors: Vec<AggregatedIssue>,
}

impl ErrorAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_warning(&mut self, message: impl Into<String>, component: impl Into<String>) {
        self.warnings.push(AggregatedIssue {
            message: message.into(),
            component: component.into(),
        });
    }

    pub fn add_error(&mut self, message: impl Into<String>, component: impl Into<String>) {
        self.errors.push(AggregatedIssue {
            message: message.into(),
            component: component.into(),
        });
    }

    /// File a taxonomy error under warnings or errors according to its severity
    pub fn record(&mut self, err: &DeskScoutError, component: impl Into<String>) {
        match assess_severity(err) {
            ErrorSeverity::Warning => self.add_warning(err.to_string(), component),
            ErrorSeverity::Recoverable | ErrorSeverity::Critical => {
                self.add_error(err.to_string(), component)
            }
        }
    }

    pub fn warnings(&self) -> &[AggregatedIssue] {
        &self.warnings
    }

    pub fn errors(&self) -> &[AggregatedIssue] {
        &self.errors
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_issues(&self) -> bool {
        self.has_warnings() || self.has_errors()
    }

    pub fn clear(&mut self) {
        self.warnings.clear();
        self.errors.clear();
    }

    pub fn summary(&self) -> String {
        if !self.has_issues() {
            return "No issues".to_string();
        }

        let mut out = String::new();
        if self.has_errors() {
            out.push_str(&format!("Errors ({}):\n", self.errors.len()));
            for issue in &self.errors {
                out.push_str(&format!("  - [{}] {}\n", issue.component, issue.message));
            }
        }
        if self.has_warnings() {
            out.push_str(&format!("Warnings ({}):\n", self.warnings.len()));
            for issue in &self.warnings {
                out.push_str(&format!("  - [{}] {}\n", issue.component, issue.message));
            }
        }
        out
    }
}
