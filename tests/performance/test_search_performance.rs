//! Search and enumeration latency tests
//!
//! Thresholds are the engine's own targets; synthetic desktops are sized well past
//! what a real session holds.

use crate::common::synthetic_desktop;
use deskscout::config::ManagerConfig;
use deskscout::platform::InMemoryEnumerator;
use deskscout::{
    SearchField, SearchQuery, WindowFilter, WindowManager, SEARCH_PERFORMANCE_TARGET,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn manager_with(count: usize, workspaces: usize, config: ManagerConfig) -> WindowManager {
    let (windows, spaces) = synthetic_desktop(count, workspaces);
    WindowManager::with_config(
        Arc::new(InMemoryEnumerator::new_with(windows, spaces)),
        config,
    )
}

#[tokio::test]
async fn test_keyword_search_meets_target_on_large_desktop() {
    let manager = manager_with(5_000, 4, ManagerConfig::default());

    let result = manager.search_windows("terminal").await.unwrap();
    assert_eq!(result.filtered_count, 1_250);
    assert!(result.meets_performance_target());
    assert!(result.search_time < SEARCH_PERFORMANCE_TARGET);
}

#[tokio::test]
async fn test_oversized_match_set_is_left_unsorted_but_complete() {
    let manager = manager_with(4_000, 1, ManagerConfig::default());

    let result = manager.search_windows("window").await.unwrap();
    assert_eq!(result.filtered_count, 4_000);
    assert!(result.is_valid());
}

#[tokio::test]
async fn test_cached_search_is_not_slower_than_first() {
    let manager = manager_with(3_000, 3, ManagerConfig::default());
    let query = SearchQuery::new("code").with_field(SearchField::Owner);

    let started = Instant::now();
    manager.search_windows_with_query(&query).await.unwrap();
    let cold = started.elapsed();

    let started = Instant::now();
    let warm_result = manager.search_windows_with_query(&query).await.unwrap();
    let warm = started.elapsed();

    assert_eq!(warm_result.filtered_count, 750);
    assert!(warm <= cold + Duration::from_millis(5));
    assert_eq!(manager.get_performance_metrics().await.filter_cache.hits, 1);
}

#[tokio::test]
async fn test_cache_cap_keeps_visible_windows() {
    let config = ManagerConfig {
        max_cached_windows: 1_000,
        ..ManagerConfig::default()
    };
    let manager = manager_with(2_000, 2, config);

    let windows = manager.get_all_windows().await.unwrap();
    assert_eq!(windows.len(), 1_000);
    assert!(windows.iter().all(|w| w.is_visible));
}

#[tokio::test]
async fn test_workspace_search_meets_target() {
    let manager = manager_with(2_000, 8, ManagerConfig::default());
    let query = SearchQuery::new("mail").in_workspace("ws3");

    let started = Instant::now();
    let result = manager.search_windows_with_workspaces(&query).await.unwrap();
    assert!(started.elapsed() < SEARCH_PERFORMANCE_TARGET);
    assert!(result.windows.iter().all(|w| w.workspace_id == "ws3"));
    assert_eq!(result.workspaces.len(), 8);
    assert_eq!(result.workspace_ids(), vec!["ws3".to_string()]);
}

#[tokio::test]
async fn test_filter_cache_stays_bounded() {
    let (windows, _) = synthetic_desktop(200, 1);
    let filter = WindowFilter::new(16);

    for i in 0..100 {
        filter
            .filter(&windows, &SearchQuery::new(format!("window {}", i)))
            .await;
    }

    let stats = filter.cache_stats().await;
    assert_eq!(stats.entries, 16);
    assert_eq!(stats.requests, 100);
}

#[tokio::test]
async fn test_concurrent_searches_share_the_cache() {
    let manager = Arc::new(manager_with(1_000, 2, ManagerConfig::default()));
    manager.get_all_windows().await.unwrap();

    let tasks: Vec<_> = (0..16)
        .map(|i| {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move {
                let keyword = ["editor", "browser", "terminal", "mail"][i % 4];
                manager.search_windows(keyword).await.map(|r| r.filtered_count)
            })
        })
        .collect();

    for task in tasks {
        assert_eq!(task.await.unwrap().unwrap(), 250);
    }
    assert!(manager.meets_performance_requirements());
}
