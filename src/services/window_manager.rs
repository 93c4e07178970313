use crate::config::ManagerConfig;
use crate::error_recovery::{classify_error, report, ErrorAggregator, ErrorContext};
use crate::models::{
    FilterResult, FocusOperation, RequestIdGenerator, SearchQuery, UuidRequestIds, Window,
    Workspace,
};
use crate::platform::WindowEnumerator;
use crate::services::focus_coordinator::{FocusConfig, FocusCoordinator};
use crate::services::search_engine::{FilterCacheStats, WindowFilter};
use crate::services::window_cache::{CacheConfig, WindowCache};
use crate::{DeskScoutError, Result};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

/// Window enumeration slower than this misses the performance target
pub const MAX_ENUMERATION_TIME: Duration = Duration::from_secs(3);

/// Snapshot of engine timings and cache state
#[derive(Debug, Clone)]
pub struct PerformanceMetrics {
    /// Duration of the last window enumeration
    pub window_enumeration_time: Duration,
    /// Duration of the last workspace enumeration
    pub workspace_enumeration_time: Duration,
    /// Windows currently held by the cache
    pub total_window_count: usize,
    /// Workspaces currently held by the cache
    pub total_workspace_count: usize,
    /// Window list is within its TTL
    pub window_cache_valid: bool,
    /// Workspace list is within its TTL
    pub workspace_cache_valid: bool,
    /// Last window enumeration finished within [`MAX_ENUMERATION_TIME`]
    pub meets_window_performance_target: bool,
    /// Last workspace enumeration stayed under the warning threshold
    pub meets_workspace_performance_target: bool,
    /// Memoized search result statistics
    pub filter_cache: FilterCacheStats,
    /// Entries in the focus history
    pub recorded_focus_operations: usize,
}

impl fmt::Display for PerformanceMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Window enumeration: {}ms ({} windows, cache {})",
            self.window_enumeration_time.as_millis(),
            self.total_window_count,
            if self.window_cache_valid { "valid" } else { "stale" }
        )?;
        writeln!(
            f,
            "Workspace enumeration: {}ms ({} workspaces, cache {})",
            self.workspace_enumeration_time.as_millis(),
            self.total_workspace_count,
            if self.workspace_cache_valid { "valid" } else { "stale" }
        )?;
        writeln!(
            f,
            "Filter cache: {}/{} entries, hit ratio {:.2}",
            self.filter_cache.entries,
            self.filter_cache.capacity,
            self.filter_cache.hit_ratio()
        )?;
        write!(
            f,
            "Targets met: windows={} workspaces={}",
            self.meets_window_performance_target, self.meets_workspace_performance_target
        )
    }
}

/// Entry point for window queries and focus requests.
///
/// Owns the caches, the filter, the focus coordinator and its rate limiter. All
/// methods take `&self` and are safe to call from concurrent tasks, including an
/// external scheduler that calls [`refresh_all_caches`](Self::refresh_all_caches).
pub struct WindowManager {
    enumerator: Arc<dyn WindowEnumerator>,
    config: ManagerConfig,
    cache: WindowCache,
    filter: WindowFilter,
    focus: FocusCoordinator,
    issues: RwLock<ErrorAggregator>,
}

impl WindowManager {
    pub fn new(enumerator: Arc<dyn WindowEnumerator>) -> Self {
        Self::with_config(enumerator, ManagerConfig::default())
    }

    pub fn with_config(enumerator: Arc<dyn WindowEnumerator>, config: ManagerConfig) -> Self {
        Self::with_request_ids(enumerator, config, Arc::new(UuidRequestIds))
    }

    pub fn with_request_ids(
        enumerator: Arc<dyn WindowEnumerator>,
        config: ManagerConfig,
        request_ids: Arc<dyn RequestIdGenerator>,
    ) -> Self {
        let cache = WindowCache::new(
            Arc::clone(&enumerator),
            CacheConfig {
                window_ttl: config.window_ttl(),
                workspace_ttl: config.workspace_ttl(),
                max_windows: config.max_cached_windows,
                workspace_warning: config.workspace_enumeration_warning(),
                enabled: config.caching_enabled,
            },
        );
        let focus = FocusCoordinator::with_request_ids(
            Arc::clone(&enumerator),
            FocusConfig {
                validation_timeout: config.validation_timeout(),
                history_size: config.focus_history_size,
                rate_limit_max_requests: config.rate_limit_max_requests,
                rate_limit_window: config.rate_limit_window(),
            },
            request_ids,
        );
        let filter =
            WindowFilter::new(config.filter_cache_capacity).with_caching(config.caching_enabled);

        Self {
            enumerator,
            cache,
            filter,
            focus,
            issues: RwLock::new(ErrorAggregator::new()),
            config,
        }
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    // ----- windows -----

    /// All windows, served from the cache while it is fresh
    #[instrument(skip(self))]
    pub async fn get_all_windows(&self) -> Result<Vec<Window>> {
        self.cache.windows().await
    }

    /// Force a re-enumeration; `false` if the platform failed
    #[instrument(skip(self))]
    pub async fn refresh_windows(&self) -> bool {
        self.cache.refresh_windows().await
    }

    #[instrument(skip(self))]
    pub async fn search_windows(&self, keyword: &str) -> Result<FilterResult> {
        self.search_windows_with_query(&SearchQuery::new(keyword))
            .await
    }

    #[instrument(skip_all, fields(query = %query.query))]
    pub async fn search_windows_with_query(&self, query: &SearchQuery) -> Result<FilterResult> {
        check_query(query)?;
        let windows = self.get_all_windows().await?;
        Ok(self.filter.filter(&windows, query).await)
    }

    /// Zero-match result for `query`
    pub fn get_empty_result(&self, query: &SearchQuery) -> FilterResult {
        FilterResult::empty(query.clone())
    }

    /// Window details straight from the platform; `None` if unknown or unreachable
    pub async fn get_window_by_handle(&self, handle: &str) -> Option<Window> {
        match self.enumerator.get_window_info(handle) {
            Ok(window) => window,
            Err(err) => {
                debug!(handle, error = %err, "Window lookup failed");
                None
            }
        }
    }

    // ----- workspaces -----

    #[instrument(skip(self))]
    pub async fn get_all_workspaces(&self) -> Result<Vec<Workspace>> {
        self.cache.workspaces().await
    }

    pub async fn get_current_workspace(&self) -> Result<Option<Workspace>> {
        if !self.enumerator.is_workspace_supported() {
            return Ok(None);
        }
        self.enumerator
            .get_current_workspace()
            .map_err(|err| workspace_error(&err).into())
    }

    /// Windows from every workspace; plain enumeration when workspaces are unsupported
    #[instrument(skip(self))]
    pub async fn get_all_workspace_windows(&self) -> Result<Vec<Window>> {
        if !self.enumerator.is_workspace_supported() {
            return self.get_all_windows().await;
        }
        self.enumerator
            .enumerate_all_workspace_windows()
            .map_err(|err| classify_error(&err, DeskScoutError::WindowEnumeration).into())
    }

    pub async fn get_windows_on_workspace(&self, workspace_id: &str) -> Result<Vec<Window>> {
        if !self.enumerator.is_workspace_supported() {
            return self.get_all_windows().await;
        }
        self.enumerator
            .get_windows_on_workspace(workspace_id)
            .map_err(|err| classify_error(&err, DeskScoutError::WindowEnumeration).into())
    }

    /// The focused window, enriched with workspace details when available
    pub async fn get_focused_window_across_workspaces(&self) -> Result<Option<Window>> {
        let focused = self
            .enumerator
            .get_focused_window()
            .map_err(|err| classify_error(&err, DeskScoutError::WindowEnumeration))?;

        let Some(window) = focused else {
            return Ok(None);
        };
        if !self.enumerator.is_workspace_supported() {
            return Ok(Some(window));
        }

        match self.enumerator.get_enhanced_window_info(&window.handle) {
            Ok(Some(enhanced)) => Ok(Some(enhanced)),
            Ok(None) => Ok(Some(window)),
            Err(err) => {
                debug!(error = %err, "Enhanced window info unavailable");
                Ok(Some(window))
            }
        }
    }

    #[instrument(skip_all, fields(query = %query.query))]
    pub async fn search_windows_with_workspaces(&self, query: &SearchQuery) -> Result<FilterResult> {
        if !self.enumerator.is_workspace_supported() {
            return self.search_windows_with_query(query).await;
        }
        check_query(query)?;

        let windows = self.get_all_workspace_windows().await?;
        let workspaces = self.get_all_workspaces().await?;
        Ok(self
            .filter
            .filter_with_workspaces(&windows, query, &workspaces)
            .await)
    }

    // ----- focus -----

    #[instrument(skip(self))]
    pub async fn focus_window_by_handle(&self, handle: &str, allow_workspace_switch: bool) -> bool {
        self.focus.focus_window(handle, allow_workspace_switch).await
    }

    pub async fn validate_handle(&self, handle: &str) -> bool {
        self.focus.validate_handle(handle).await
    }

    pub async fn validate_handle_with_timeout(&self, handle: &str, timeout: Duration) -> bool {
        self.focus.validate_with_timeout(handle, timeout).await
    }

    pub async fn get_focus_history(&self) -> Vec<FocusOperation> {
        self.focus.history().await
    }

    pub async fn get_last_focus_operation(&self) -> Option<FocusOperation> {
        self.focus.last_operation().await
    }

    pub async fn clear_focus_history(&self) {
        self.focus.clear_history().await;
    }

    // ----- caching -----

    /// Turning caching off drops cached windows, workspaces and filter results
    pub async fn enable_caching(&self, enabled: bool) {
        self.cache.set_enabled(enabled).await;
        self.filter.set_caching(enabled).await;
        info!(enabled, "Caching toggled");
    }

    pub fn is_caching_enabled(&self) -> bool {
        self.cache.is_enabled()
    }

    pub async fn invalidate_cache(&self) {
        self.cache.invalidate_windows().await;
    }

    pub async fn invalidate_workspace_cache(&self) {
        self.cache.invalidate_workspaces().await;
    }

    /// Refetch windows and workspaces, collecting every problem instead of stopping
    /// at the first. Returns `true` when no errors were recorded.
    #[instrument(skip(self))]
    pub async fn refresh_all_caches(&self) -> bool {
        self.cache.invalidate_windows().await;
        self.cache.invalidate_workspaces().await;

        let mut issues = ErrorAggregator::new();

        if let Err(err) = self.cache.windows().await {
            let err = classify_error(&err, DeskScoutError::WindowEnumeration);
            report(&err, &ErrorContext::new("refresh_all_caches", "window_cache"));
            issues.record(&err, "window_cache");
        }

        match self.cache.workspaces().await {
            Ok(_) => {
                let elapsed = self.cache.last_workspace_enumeration().await;
                let threshold = self.config.workspace_enumeration_warning();
                if elapsed > threshold {
                    issues.record(
                        &DeskScoutError::PerformanceWarning {
                            operation: "enumerate_workspaces".to_string(),
                            actual_ms: elapsed.as_millis() as u64,
                            target_ms: threshold.as_millis() as u64,
                        },
                        "workspace_cache",
                    );
                }
            }
            Err(err) => {
                let err = workspace_error(&err);
                report(&err, &ErrorContext::new("refresh_all_caches", "workspace_cache"));
                issues.record(&err, "workspace_cache");
            }
        }

        let ok = !issues.has_errors();
        if issues.has_issues() {
            warn!(summary = %issues.summary(), "Cache refresh reported issues");
        }
        *self.issues.write().await = issues;
        ok
    }

    /// Issues collected by the last [`refresh_all_caches`](Self::refresh_all_caches)
    pub async fn aggregated_issues(&self) -> ErrorAggregator {
        self.issues.read().await.clone()
    }

    // ----- introspection -----

    pub fn system_info(&self) -> String {
        self.enumerator.platform_info()
    }

    /// Windows currently held in the cache
    pub async fn total_window_count(&self) -> usize {
        self.cache.cached_window_count().await
    }

    pub async fn workspace_count(&self) -> usize {
        self.cache.cached_workspace_count().await
    }

    /// Last window enumeration finished within [`MAX_ENUMERATION_TIME`]
    pub fn meets_performance_requirements(&self) -> bool {
        self.enumerator.last_enumeration_time() <= MAX_ENUMERATION_TIME
    }

    pub async fn get_performance_metrics(&self) -> PerformanceMetrics {
        let workspace_enumeration_time = self.cache.last_workspace_enumeration().await;
        PerformanceMetrics {
            window_enumeration_time: self.cache.last_window_enumeration().await,
            workspace_enumeration_time,
            total_window_count: self.total_window_count().await,
            total_workspace_count: self.workspace_count().await,
            window_cache_valid: self.cache.is_window_cache_valid().await,
            workspace_cache_valid: self.cache.is_workspace_cache_valid().await,
            meets_window_performance_target: self.meets_performance_requirements(),
            meets_workspace_performance_target: workspace_enumeration_time
                <= self.config.workspace_enumeration_warning(),
            filter_cache: self.filter.cache_stats().await,
            recorded_focus_operations: self.focus.history().await.len(),
        }
    }
}

/// Only the term length is enforced; a pattern that fails to compile matches as plain text
fn check_query(query: &SearchQuery) -> Result<()> {
    if query.query.chars().count() <= crate::models::MAX_QUERY_LENGTH {
        return Ok(());
    }
    Err(DeskScoutError::Filter(format!(
        "query exceeds {} characters",
        crate::models::MAX_QUERY_LENGTH
    ))
    .into())
}

fn workspace_error(err: &anyhow::Error) -> DeskScoutError {
    classify_error(err, |details| DeskScoutError::Workspace {
        details,
        degradable: true,
    })
}
