//! Contract tests for the focus workflow
//! The enumerator is scripted with mockall so each platform call is counted.

use crate::common::{chrome, main_workspace, remote_editor, second_workspace, MockEnumerator};
use deskscout::config::ManagerConfig;
use deskscout::platform::InMemoryEnumerator;
use deskscout::{
    FocusStatus, SequentialRequestIds, WindowManager, SWITCH_NOT_ALLOWED,
};
use mockall::predicate::eq;
use std::sync::Arc;
use std::time::Duration;

/// Mock answering for one window, with workspaces and switching available
fn scripted(window: deskscout::Window) -> MockEnumerator {
    let mut mock = MockEnumerator::new();
    let handle = window.handle.clone();
    mock.expect_is_window_valid()
        .returning(move |h| Ok(h == handle));
    let info = window.clone();
    mock.expect_get_window_info()
        .returning(move |_| Ok(Some(info.clone())));
    mock.expect_get_current_workspace()
        .returning(|| Ok(Some(main_workspace())));
    mock.expect_can_switch_workspaces().return_const(true);
    mock
}

fn manager(mock: MockEnumerator) -> WindowManager {
    WindowManager::with_request_ids(
        Arc::new(mock),
        ManagerConfig::default(),
        Arc::new(SequentialRequestIds::new()),
    )
}

#[cfg(test)]
mod focus_coordinator_contract_tests {
    use super::*;

    #[tokio::test]
    async fn test_same_workspace_focus_completes() {
        let mut mock = scripted(chrome());
        mock.expect_switch_to_workspace().never();
        mock.expect_focus_window()
            .with(eq("1"))
            .times(1)
            .returning(|_| Ok(true));
        let manager = manager(mock);

        assert!(manager.focus_window_by_handle("1", true).await);

        let op = manager.get_last_focus_operation().await.unwrap();
        assert_eq!(op.status, FocusStatus::Completed);
        assert!(!op.workspace_switched);
        assert!(!op.request.cross_workspace);
        assert_eq!(op.request.request_id, "focus-1");
    }

    #[tokio::test]
    async fn test_disallowed_switch_fails_before_focusing() {
        let mut window = remote_editor();
        window.handle = "abc".into();
        let mut mock = scripted(window);
        mock.expect_switch_to_workspace().never();
        mock.expect_focus_window().never();
        let manager = manager(mock);

        assert!(!manager.focus_window_by_handle("abc", false).await);

        let op = manager.get_last_focus_operation().await.unwrap();
        assert_eq!(op.status, FocusStatus::Failed);
        assert!(op.error_message.contains(SWITCH_NOT_ALLOWED));
        assert!(op.remediation.is_some());
        assert!(!op.workspace_switched);
    }

    #[tokio::test]
    async fn test_cross_workspace_focus_switches_and_restores() {
        let mut mock = scripted(remote_editor());
        mock.expect_switch_to_workspace()
            .with(eq("ws2"))
            .times(1)
            .returning(|_| Ok(true));
        mock.expect_focus_window().times(1).returning(|_| Ok(true));
        let manager = manager(mock);

        assert!(manager.focus_window_by_handle("3", true).await);

        let op = manager.get_last_focus_operation().await.unwrap();
        assert_eq!(op.status, FocusStatus::Completed);
        assert!(op.workspace_switched);
        assert!(op.window_restored);
        assert_eq!(op.request.source_workspace_id, "ws1");
        assert_eq!(op.request.target_workspace_id, "ws2");
    }

    #[tokio::test]
    async fn test_refused_switch_still_attempts_direct_focus() {
        let mut mock = scripted(remote_editor());
        mock.expect_switch_to_workspace().returning(|_| Ok(false));
        mock.expect_focus_window().times(1).returning(|_| Ok(true));
        let manager = manager(mock);

        assert!(manager.focus_window_by_handle("3", true).await);
        assert_eq!(
            manager.get_last_focus_operation().await.unwrap().status,
            FocusStatus::Completed
        );
    }

    #[tokio::test]
    async fn test_platform_focus_error_is_recorded() {
        let mut mock = scripted(chrome());
        mock.expect_focus_window()
            .returning(|_| Err(anyhow::anyhow!("permission denied")));
        let manager = manager(mock);

        assert!(!manager.focus_window_by_handle("1", true).await);

        let op = manager.get_last_focus_operation().await.unwrap();
        assert_eq!(op.status, FocusStatus::Failed);
        assert!(op.error_message.contains("Permission denied"));
        assert_eq!(
            op.remediation.as_deref(),
            Some("grant accessibility permissions and retry")
        );
    }

    #[tokio::test]
    async fn test_unknown_handle_never_reaches_focus() {
        let mut mock = scripted(chrome());
        mock.expect_focus_window().never();
        let manager = manager(mock);

        assert!(!manager.focus_window_by_handle("missing", true).await);
        assert!(!manager.validate_handle("missing").await);
        assert!(!manager.validate_handle("").await);
        assert_eq!(manager.get_focus_history().await.len(), 1);
    }

    #[tokio::test]
    async fn test_eleventh_request_never_reaches_enumerator() {
        let mut mock = MockEnumerator::new();
        mock.expect_is_window_valid().times(10).returning(|_| Ok(true));
        mock.expect_get_window_info()
            .times(10)
            .returning(|_| Ok(Some(chrome())));
        mock.expect_get_current_workspace()
            .returning(|| Ok(Some(main_workspace())));
        mock.expect_focus_window().times(10).returning(|_| Ok(true));
        let manager = manager(mock);

        for _ in 0..10 {
            assert!(manager.focus_window_by_handle("1", true).await);
        }
        assert!(!manager.focus_window_by_handle("1", true).await);

        // rate-limited calls leave no trace in the history
        assert_eq!(manager.get_focus_history().await.len(), 10);
    }

    #[tokio::test]
    async fn test_rate_limit_window_slides() {
        let enumerator = Arc::new(InMemoryEnumerator::new_with(
            vec![chrome()],
            vec![main_workspace(), second_workspace()],
        ));
        let config = ManagerConfig {
            rate_limit_max_requests: 2,
            rate_limit_window_ms: 50,
            ..ManagerConfig::default()
        };
        let manager = WindowManager::with_config(enumerator.clone(), config);

        assert!(manager.focus_window_by_handle("1", true).await);
        assert!(manager.focus_window_by_handle("1", true).await);
        assert!(!manager.focus_window_by_handle("1", true).await);
        assert_eq!(enumerator.focus_calls(), 2);

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(manager.focus_window_by_handle("1", true).await);
        assert_eq!(enumerator.focus_calls(), 3);
    }

    #[tokio::test]
    async fn test_slow_validation_times_out() {
        let enumerator = Arc::new(InMemoryEnumerator::new_with(vec![chrome()], Vec::new()));
        enumerator.set_validation_delay(Duration::from_millis(200));
        let manager = WindowManager::new(enumerator.clone());

        assert!(
            !manager
                .validate_handle_with_timeout("1", Duration::from_millis(20))
                .await
        );
        assert!(
            manager
                .validate_handle_with_timeout("1", Duration::from_secs(2))
                .await
        );
    }

    #[tokio::test]
    async fn test_history_can_be_cleared() {
        let manager = WindowManager::new(Arc::new(InMemoryEnumerator::new_with(
            vec![chrome()],
            Vec::new(),
        )));
        manager.focus_window_by_handle("1", true).await;
        assert!(manager.get_last_focus_operation().await.is_some());

        manager.clear_focus_history().await;
        assert!(manager.get_focus_history().await.is_empty());
        assert!(manager.get_last_focus_operation().await.is_none());
    }
}
