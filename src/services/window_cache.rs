//! Time-bounded window and workspace caches
//!
//! Each cache owns one lock, taken only to read or replace its entry. Enumerator calls
//! run with no lock held, so a slow platform never blocks readers of fresh data.

use crate::error_recovery::classify_error;
use crate::models::{Window, Workspace};
use crate::platform::WindowEnumerator;
use crate::{DeskScoutError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, error, warn};

/// Lists at or below this size use an unstable sort
const UNSTABLE_SORT_LIMIT: usize = 100;

#[derive(Debug, Clone)]
struct CacheEntry<T> {
    payload: T,
    fetched_at: Instant,
    ttl: Duration,
}

impl<T> CacheEntry<T> {
    fn new(payload: T, ttl: Duration) -> Self {
        Self {
            payload,
            fetched_at: Instant::now(),
            ttl,
        }
    }

    fn is_fresh(&self) -> bool {
        self.fetched_at.elapsed() < self.ttl
    }
}

/// Cache settings
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// How long an enumerated window list stays fresh
    pub window_ttl: Duration,
    /// How long an enumerated workspace list stays fresh
    pub workspace_ttl: Duration,
    /// Upper bound on cached windows; invisible windows are dropped first
    pub max_windows: usize,
    /// Workspace enumeration slower than this is logged as a warning
    pub workspace_warning: Duration,
    /// Initial caching state; disabled means every read enumerates
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            window_ttl: Duration::from_secs(5),
            workspace_ttl: Duration::from_secs(10),
            max_windows: 10_000,
            workspace_warning: Duration::from_secs(1),
            enabled: true,
        }
    }
}

pub struct WindowCache {
    enumerator: Arc<dyn WindowEnumerator>,
    config: CacheConfig,
    enabled: AtomicBool,
    windows: RwLock<Option<CacheEntry<Vec<Window>>>>,
    workspaces: RwLock<Option<CacheEntry<Vec<Workspace>>>>,
    window_enumeration_time: RwLock<Duration>,
    workspace_enumeration_time: RwLock<Duration>,
}

impl WindowCache {
    pub fn new(enumerator: Arc<dyn WindowEnumerator>, config: CacheConfig) -> Self {
        Self {
            enumerator,
            enabled: AtomicBool::new(config.enabled),
            config,
            windows: RwLock::new(None),
            workspaces: RwLock::new(None),
            window_enumeration_time: RwLock::new(Duration::ZERO),
            workspace_enumeration_time: RwLock::new(Duration::ZERO),
        }
    }

    /// Cached windows while fresh, otherwise a new enumeration.
    ///
    /// A failed enumeration clears the cache and returns the classified error.
    pub async fn windows(&self) -> Result<Vec<Window>> {
        if self.is_enabled() {
            if let Some(entry) = self.windows.read().await.as_ref() {
                if entry.is_fresh() {
                    debug!(count = entry.payload.len(), "Window cache hit");
                    return Ok(entry.payload.clone());
                }
            }
        }

        let started = Instant::now();
        let fetched = self.enumerator.enumerate_windows();
        let elapsed = started.elapsed();

        match fetched {
            Ok(windows) => {
                let windows = prepare_windows(windows, self.config.max_windows);
                *self.window_enumeration_time.write().await = elapsed;
                debug!(
                    count = windows.len(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Window cache refreshed"
                );
                if self.is_enabled() {
                    *self.windows.write().await =
                        Some(CacheEntry::new(windows.clone(), self.config.window_ttl));
                }
                Ok(windows)
            }
            Err(err) => {
                self.invalidate_windows().await;
                let classified = classify_error(&err, DeskScoutError::WindowEnumeration);
                error!(error = %classified, "Window enumeration failed");
                Err(classified.into())
            }
        }
    }

    /// Drop the cached windows and fetch again; failures become `false`
    pub async fn refresh_windows(&self) -> bool {
        self.invalidate_windows().await;
        match self.windows().await {
            Ok(_) => true,
            Err(err) => {
                warn!(error = %err, "Window refresh failed");
                false
            }
        }
    }

    /// Cached workspaces while fresh, otherwise a new enumeration. Platforms without
    /// virtual desktops get the synthetic default workspace.
    pub async fn workspaces(&self) -> Result<Vec<Workspace>> {
        if !self.enumerator.is_workspace_supported() {
            return Ok(vec![Workspace::synthetic_default()]);
        }

        if self.is_enabled() {
            if let Some(entry) = self.workspaces.read().await.as_ref() {
                if entry.is_fresh() {
                    debug!(count = entry.payload.len(), "Workspace cache hit");
                    return Ok(entry.payload.clone());
                }
            }
        }

        let started = Instant::now();
        let fetched = self.enumerator.enumerate_workspaces();
        let elapsed = started.elapsed();
        *self.workspace_enumeration_time.write().await = elapsed;

        if elapsed > self.config.workspace_warning {
            warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                threshold_ms = self.config.workspace_warning.as_millis() as u64,
                "Workspace enumeration exceeded threshold"
            );
        }

        match fetched {
            Ok(workspaces) => {
                debug!(count = workspaces.len(), "Workspace cache refreshed");
                if self.is_enabled() {
                    *self.workspaces.write().await =
                        Some(CacheEntry::new(workspaces.clone(), self.config.workspace_ttl));
                }
                Ok(workspaces)
            }
            Err(err) => {
                self.invalidate_workspaces().await;
                let classified = classify_error(&err, |details| DeskScoutError::Workspace {
                    details,
                    degradable: true,
                });
                error!(error = %classified, "Workspace enumeration failed");
                Err(classified.into())
            }
        }
    }

    pub async fn invalidate_windows(&self) {
        *self.windows.write().await = None;
    }

    pub async fn invalidate_workspaces(&self) {
        *self.workspaces.write().await = None;
    }

    /// Disabling also drops whatever is cached
    pub async fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
        if !enabled {
            self.invalidate_windows().await;
            self.invalidate_workspaces().await;
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub async fn is_window_cache_valid(&self) -> bool {
        self.windows
            .read()
            .await
            .as_ref()
            .map_or(false, CacheEntry::is_fresh)
    }

    pub async fn is_workspace_cache_valid(&self) -> bool {
        self.workspaces
            .read()
            .await
            .as_ref()
            .map_or(false, CacheEntry::is_fresh)
    }

    /// Number of windows in the cache, fresh or not
    pub async fn cached_window_count(&self) -> usize {
        self.windows
            .read()
            .await
            .as_ref()
            .map_or(0, |entry| entry.payload.len())
    }

    pub async fn cached_workspace_count(&self) -> usize {
        self.workspaces
            .read()
            .await
            .as_ref()
            .map_or(0, |entry| entry.payload.len())
    }

    pub async fn last_window_enumeration(&self) -> Duration {
        *self.window_enumeration_time.read().await
    }

    pub async fn last_workspace_enumeration(&self) -> Duration {
        *self.workspace_enumeration_time.read().await
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }
}

/// Apply the size cap and order by title.
///
/// Over the cap, invisible windows are dropped first and the rest is truncated.
fn prepare_windows(mut windows: Vec<Window>, max_windows: usize) -> Vec<Window> {
    if windows.len() > max_windows {
        let before = windows.len();
        windows.retain(|window| window.is_visible);
        windows.truncate(max_windows);
        warn!(
            before,
            after = windows.len(),
            "Window list exceeded cache limit"
        );
    }

    if windows.len() <= UNSTABLE_SORT_LIMIT {
        windows.sort_unstable_by(|a, b| a.title.cmp(&b.title));
    } else {
        windows.sort_by(|a, b| a.title.cmp(&b.title));
    }
    windows
}
