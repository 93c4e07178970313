//! Window filtering with a memoized result cache

use crate::models::{FilterResult, SearchQuery, Window, Workspace};
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Match lists larger than this are returned unsorted
const SORT_LIMIT: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FilterKey {
    window_count: usize,
    query: String,
    fingerprint: u64,
}

impl FilterKey {
    fn new(windows: &[Window], query: &SearchQuery) -> Self {
        let query = serde_json::to_string(query).unwrap_or_else(|_| query.to_string());
        Self {
            window_count: windows.len(),
            query,
            fingerprint: fingerprint(windows),
        }
    }
}

/// Order-independent hash over the fields a filter result depends on
fn fingerprint(windows: &[Window]) -> u64 {
    windows.iter().fold(0u64, |acc, window| {
        let mut hasher = DefaultHasher::new();
        window.handle.hash(&mut hasher);
        window.title.hash(&mut hasher);
        window.process_id.hash(&mut hasher);
        window.owner_name.hash(&mut hasher);
        window.workspace_id.hash(&mut hasher);
        window.is_visible.hash(&mut hasher);
        window.state.hash(&mut hasher);
        acc.wrapping_add(hasher.finish())
    })
}

/// FIFO-bounded map of filter results
#[derive(Debug)]
struct ResultCache {
    capacity: usize,
    entries: HashMap<FilterKey, FilterResult>,
    order: VecDeque<FilterKey>,
}

impl ResultCache {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    fn get(&self, key: &FilterKey) -> Option<FilterResult> {
        self.entries.get(key).cloned()
    }

    fn insert(&mut self, key: FilterKey, result: FilterResult) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.insert(key.clone(), result).is_none() {
            self.order.push_back(key);
        }
        while self.entries.len() > self.capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

/// Result cache statistics
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterCacheStats {
    /// Results currently memoized
    pub entries: usize,
    /// Most results kept before FIFO eviction
    pub capacity: usize,
    /// Filter calls since the last reset
    pub requests: u64,
    /// Calls answered from the memo
    pub hits: u64,
}

impl FilterCacheStats {
    pub fn hit_ratio(&self) -> f64 {
        if self.requests == 0 {
            return 0.0;
        }
        self.hits as f64 / self.requests as f64
    }
}

/// Applies search queries to window lists
#[derive(Debug)]
pub struct WindowFilter {
    cache: Mutex<ResultCache>,
    caching: AtomicBool,
    requests: AtomicU64,
    hits: AtomicU64,
}

impl Default for WindowFilter {
    fn default() -> Self {
        Self::new(256)
    }
}

impl WindowFilter {
    pub fn new(cache_capacity: usize) -> Self {
        Self {
            cache: Mutex::new(ResultCache::new(cache_capacity)),
            caching: AtomicBool::new(true),
            requests: AtomicU64::new(0),
            hits: AtomicU64::new(0),
        }
    }

    pub fn with_caching(self, enabled: bool) -> Self {
        self.caching.store(enabled, Ordering::SeqCst);
        self
    }

    /// Filter `windows` with `query`, serving repeated lookups from the cache.
    ///
    /// An empty query selects the visible windows; any other query searches every
    /// window regardless of visibility or workspace.
    pub async fn filter(&self, windows: &[Window], query: &SearchQuery) -> FilterResult {
        self.requests.fetch_add(1, Ordering::Relaxed);

        let key = if self.is_caching_enabled() {
            let key = FilterKey::new(windows, query);
            if let Some(result) = self.cache.lock().await.get(&key) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(query = %query.query, "Filter cache hit");
                return result;
            }
            Some(key)
        } else {
            None
        };

        let result = perform_filter(windows, query);

        if let Some(key) = key {
            self.cache.lock().await.insert(key, result.clone());
        }
        result
    }

    /// Same matching as [`filter`](Self::filter), with the workspace list attached
    pub async fn filter_with_workspaces(
        &self,
        windows: &[Window],
        query: &SearchQuery,
        workspaces: &[Workspace],
    ) -> FilterResult {
        self.filter(windows, query)
            .await
            .with_workspaces(workspaces.to_vec())
    }

    pub async fn filter_by_keyword(&self, windows: &[Window], keyword: &str) -> FilterResult {
        self.filter(windows, &SearchQuery::new(keyword)).await
    }

    /// Visible windows in their original order; bypasses the cache
    pub fn filter_visible(&self, windows: &[Window]) -> FilterResult {
        let started = Instant::now();
        let visible: Vec<Window> = windows.iter().filter(|w| w.is_visible).cloned().collect();
        FilterResult::new(visible, windows.len(), SearchQuery::default(), started.elapsed())
    }

    /// Disabling drops every cached result
    pub async fn set_caching(&self, enabled: bool) {
        self.caching.store(enabled, Ordering::SeqCst);
        if !enabled {
            self.clear_cache().await;
        }
    }

    pub fn is_caching_enabled(&self) -> bool {
        self.caching.load(Ordering::SeqCst)
    }

    pub async fn clear_cache(&self) {
        self.cache.lock().await.clear();
        self.requests.store(0, Ordering::Relaxed);
        self.hits.store(0, Ordering::Relaxed);
    }

    pub async fn cache_stats(&self) -> FilterCacheStats {
        let cache = self.cache.lock().await;
        FilterCacheStats {
            entries: cache.entries.len(),
            capacity: cache.capacity,
            requests: self.requests.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
        }
    }

    pub async fn cache_hit_ratio(&self) -> f64 {
        self.cache_stats().await.hit_ratio()
    }
}

fn perform_filter(windows: &[Window], query: &SearchQuery) -> FilterResult {
    let started = Instant::now();

    let mut matched: Vec<Window> = if query.is_empty() {
        windows.iter().filter(|w| w.is_visible).cloned().collect()
    } else {
        let matcher = query.matcher();
        windows.iter().filter(|w| matcher.matches(w)).cloned().collect()
    };

    if matched.len() <= SORT_LIMIT {
        matched.sort_by(|a, b| {
            a.title
                .cmp(&b.title)
                .then_with(|| a.process_id.cmp(&b.process_id))
        });
    }

    let result = FilterResult::new(matched, windows.len(), query.clone(), started.elapsed());
    if !result.meets_performance_target() {
        warn!(
            query = %query.query,
            elapsed_ms = result.search_time.as_millis() as u64,
            "Filter exceeded performance target"
        );
    }
    result
}
