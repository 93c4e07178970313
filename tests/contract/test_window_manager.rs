//! Contract tests for the WindowManager facade
//! Cache, search and error-surface behavior as seen through the public API.

use crate::common::{chrome, main_workspace, remote_editor, second_workspace, terminal, MockEnumerator};
use anyhow::anyhow;
use deskscout::compat::CompatibilityValidator;
use deskscout::config::ManagerConfig;
use deskscout::error_recovery::exit_code;
use deskscout::platform::InMemoryEnumerator;
use deskscout::{DeskScoutError, SearchField, SearchQuery, Window, WindowManager, Workspace};
use std::sync::Arc;
use std::time::Duration;

fn manager_over(windows: Vec<Window>, workspaces: Vec<Workspace>) -> WindowManager {
    WindowManager::new(Arc::new(InMemoryEnumerator::new_with(windows, workspaces)))
}

#[cfg(test)]
mod window_manager_contract_tests {
    use super::*;

    #[tokio::test]
    async fn test_browse_returns_visible_windows() {
        let manager = manager_over(vec![chrome(), terminal()], Vec::new());

        let result = manager.search_windows("").await.unwrap();
        let titles: Vec<&str> = result.windows.iter().map(|w| w.title.as_str()).collect();
        assert_eq!(titles, vec!["Chrome"]);
        assert_eq!(result.total_count, 2);
    }

    #[tokio::test]
    async fn test_search_results_are_matching_subset() {
        let windows = vec![chrome(), terminal(), remote_editor()];
        let manager = manager_over(windows.clone(), Vec::new());
        let query = SearchQuery::new("e");

        let result = manager.search_windows_with_query(&query).await.unwrap();
        assert!(!result.windows.is_empty());
        for window in &result.windows {
            assert!(windows.contains(window));
            assert!(query.matches(window));
        }
        assert_eq!(result.filtered_count, result.windows.len());
        assert!(result.filtered_count <= result.total_count);
    }

    #[tokio::test]
    async fn test_owner_search_ignores_case() {
        let mut shouting = chrome();
        shouting.handle = "9".into();
        shouting.owner_name = "CHROME.EXE".into();
        let manager = manager_over(vec![chrome(), terminal(), shouting], Vec::new());

        let query = SearchQuery::new("chrome").with_field(SearchField::Owner);
        let result = manager.search_windows_with_query(&query).await.unwrap();
        assert_eq!(result.filtered_count, 2);
    }

    #[tokio::test]
    async fn test_workspace_filter_limits_results() {
        let mut local_notes = remote_editor();
        local_notes.handle = "4".into();
        local_notes.workspace_id = "ws1".into();
        let manager = manager_over(
            vec![remote_editor(), local_notes],
            vec![main_workspace(), second_workspace()],
        );

        let query = SearchQuery::new("notes").in_workspace("ws2");
        let result = manager.search_windows_with_workspaces(&query).await.unwrap();
        assert_eq!(result.windows.len(), 1);
        assert_eq!(result.windows[0].workspace_id, "ws2");
        assert_eq!(result.workspaces.len(), 2);
    }

    #[tokio::test]
    async fn test_windows_within_ttl_are_identical_and_enumerated_once() {
        let mut mock = MockEnumerator::new();
        mock.expect_enumerate_windows()
            .times(1)
            .returning(|| Ok(vec![chrome(), terminal()]));
        let manager = WindowManager::new(Arc::new(mock));

        let first = manager.get_all_windows().await.unwrap();
        let second = manager.get_all_windows().await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_expired_ttl_refetches() {
        let mut mock = MockEnumerator::new();
        mock.expect_enumerate_windows()
            .times(2)
            .returning(|| Ok(vec![chrome()]));
        let config = ManagerConfig {
            window_cache_ttl_ms: 20,
            ..ManagerConfig::default()
        };
        let manager = WindowManager::with_config(Arc::new(mock), config);

        manager.get_all_windows().await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        manager.get_all_windows().await.unwrap();
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let mut mock = MockEnumerator::new();
        mock.expect_enumerate_windows()
            .times(2)
            .returning(|| Ok(vec![chrome()]));
        let manager = WindowManager::new(Arc::new(mock));

        manager.get_all_windows().await.unwrap();
        manager.invalidate_cache().await;
        manager.get_all_windows().await.unwrap();
    }

    #[tokio::test]
    async fn test_wire_record_keeps_legacy_fields_in_order() {
        let manager = manager_over(vec![remote_editor()], Vec::new());
        let window = manager.get_all_windows().await.unwrap().remove(0);

        let text = serde_json::to_string(&window).unwrap();
        let positions: Vec<usize> = [
            "\"handle\"",
            "\"title\"",
            "\"x\"",
            "\"y\"",
            "\"width\"",
            "\"height\"",
            "\"isVisible\"",
            "\"processId\"",
            "\"ownerName\"",
            "\"workspaceId\"",
        ]
        .iter()
        .map(|key| text.find(key).unwrap())
        .collect();
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));

        let report = CompatibilityValidator::new().validate_window(&window).unwrap();
        assert!(report.is_compatible(), "{}", report);
    }

    #[tokio::test]
    async fn test_enumeration_failure_is_classified() {
        let mut mock = MockEnumerator::new();
        mock.expect_enumerate_windows()
            .returning(|| Err(anyhow!("access denied by the window server")));
        let manager = WindowManager::new(Arc::new(mock));

        let err = manager.get_all_windows().await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DeskScoutError>(),
            Some(DeskScoutError::PermissionDenied(_))
        ));
        assert_eq!(exit_code(&err), 3);
        assert_eq!(manager.total_window_count().await, 0);
    }

    #[tokio::test]
    async fn test_soft_refresh_reports_false() {
        let mut mock = MockEnumerator::new();
        mock.expect_enumerate_windows()
            .returning(|| Err(anyhow!("display connection lost")));
        let manager = WindowManager::new(Arc::new(mock));

        assert!(!manager.refresh_windows().await);
    }

    #[tokio::test]
    async fn test_overlong_query_is_rejected() {
        let manager = manager_over(vec![chrome()], Vec::new());
        let query = SearchQuery::new("x".repeat(1001));

        let err = manager.search_windows_with_query(&query).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DeskScoutError>(),
            Some(DeskScoutError::Filter(_))
        ));
    }

    #[tokio::test]
    async fn test_uncompilable_regex_matches_as_text() {
        let mut commit = chrome();
        commit.title = "git commit -m fix(parser)".into();
        let manager = manager_over(
            vec![commit, terminal()],
            vec![main_workspace(), second_workspace()],
        );

        let query = SearchQuery::new("fix(").regex(true);
        let result = manager.search_windows_with_query(&query).await.unwrap();
        assert_eq!(result.filtered_count, 1);
        assert_eq!(result.windows[0].title, "git commit -m fix(parser)");

        let grouped = manager.search_windows_with_workspaces(&query).await.unwrap();
        assert_eq!(grouped.filtered_count, 1);
    }

    #[tokio::test]
    async fn test_unsupported_workspaces_degrade() {
        let mut mock = MockEnumerator::new();
        mock.expect_is_workspace_supported().return_const(false);
        mock.expect_enumerate_windows()
            .returning(|| Ok(vec![chrome()]));
        let manager = WindowManager::new(Arc::new(mock));

        let workspaces = manager.get_all_workspaces().await.unwrap();
        assert_eq!(workspaces, vec![Workspace::synthetic_default()]);
        assert!(manager.get_current_workspace().await.unwrap().is_none());
        assert_eq!(manager.get_windows_on_workspace("ws9").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_refresh_all_caches_collects_every_failure() {
        let enumerator = Arc::new(InMemoryEnumerator::new_with(
            vec![chrome()],
            vec![main_workspace()],
        ));
        let manager = WindowManager::new(enumerator.clone());
        assert!(manager.refresh_all_caches().await);
        assert!(!manager.aggregated_issues().await.has_issues());

        enumerator.fail_enumeration(Some(DeskScoutError::WindowEnumeration("gone".into())));
        assert!(!manager.refresh_all_caches().await);

        let issues = manager.aggregated_issues().await;
        assert_eq!(issues.errors().len(), 2);
        assert!(issues.summary().contains("window_cache"));
    }

    #[tokio::test]
    async fn test_focused_window_is_enriched() {
        let focused = remote_editor().with_state(deskscout::WindowState::Focused);
        let mut bare = focused.clone();
        bare.workspace_name.clear();
        let manager = manager_over(vec![bare], vec![main_workspace(), second_workspace()]);

        let window = manager
            .get_focused_window_across_workspaces()
            .await
            .unwrap()
            .unwrap();
        assert_eq!(window.workspace_name, "Second");
    }

    #[tokio::test]
    async fn test_lookup_and_workspace_listing() {
        let manager = manager_over(
            vec![chrome(), terminal(), remote_editor()],
            vec![main_workspace(), second_workspace()],
        );

        assert_eq!(manager.get_window_by_handle("3").await.unwrap().title, "Notes");
        assert!(manager.get_window_by_handle("nope").await.is_none());
        assert_eq!(manager.get_all_workspace_windows().await.unwrap().len(), 3);
        assert_eq!(manager.get_windows_on_workspace("ws2").await.unwrap().len(), 1);

        let empty = manager.get_empty_result(&SearchQuery::new("zzz"));
        assert!(empty.windows.is_empty());
        assert!(empty.is_valid());
    }

    #[tokio::test]
    async fn test_workspace_cache_invalidation_refetches() {
        let enumerator = Arc::new(InMemoryEnumerator::new_with(
            vec![chrome()],
            vec![main_workspace()],
        ));
        let manager = WindowManager::new(enumerator.clone());
        assert_eq!(manager.get_all_workspaces().await.unwrap().len(), 1);

        enumerator.set_workspaces(vec![main_workspace(), second_workspace()]);
        assert_eq!(manager.get_all_workspaces().await.unwrap().len(), 1);

        manager.invalidate_workspace_cache().await;
        assert_eq!(manager.get_all_workspaces().await.unwrap().len(), 2);
        assert_eq!(manager.workspace_count().await, 2);
    }

    #[tokio::test]
    async fn test_metrics_reflect_cache_state() {
        let manager = manager_over(vec![chrome(), terminal()], vec![main_workspace()]);
        manager.get_all_windows().await.unwrap();
        manager.search_windows("chrome").await.unwrap();
        manager.search_windows("chrome").await.unwrap();

        let metrics = manager.get_performance_metrics().await;
        assert_eq!(metrics.total_window_count, 2);
        assert!(metrics.window_cache_valid);
        assert_eq!(metrics.filter_cache.hits, 1);
        assert!(metrics.meets_window_performance_target);
    }
}
