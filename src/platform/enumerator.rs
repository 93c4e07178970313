use crate::models::{Window, WindowState, Workspace};
use crate::{DeskScoutError, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

/// Abstraction over a platform's window and virtual desktop APIs.
///
/// Every call may block on the platform, so the engine never holds its own locks
/// across one. Fallible calls report failures as `anyhow::Error`; the engine maps them
/// onto [`DeskScoutError`] before surfacing them.
pub trait WindowEnumerator: Send + Sync {
    /// Snapshot all top-level windows
    fn enumerate_windows(&self) -> Result<Vec<Window>>;

    /// Ask the platform to rebuild its internal window list
    fn refresh_window_list(&self) -> Result<bool>;

    fn get_window_info(&self, handle: &str) -> Result<Option<Window>>;

    /// Bring a window to the front, restoring it if minimized
    fn focus_window(&self, handle: &str) -> Result<bool>;

    fn is_window_valid(&self, handle: &str) -> Result<bool>;

    fn enumerate_workspaces(&self) -> Result<Vec<Workspace>>;

    fn get_current_workspace(&self) -> Result<Option<Workspace>>;

    /// Windows from every workspace with workspace membership filled in
    fn enumerate_all_workspace_windows(&self) -> Result<Vec<Window>>;

    fn get_windows_on_workspace(&self, workspace_id: &str) -> Result<Vec<Window>>;

    /// Window info including workspace and state details
    fn get_enhanced_window_info(&self, handle: &str) -> Result<Option<Window>>;

    fn is_workspace_supported(&self) -> bool;

    fn get_focused_window(&self) -> Result<Option<Window>>;

    fn switch_to_workspace(&self, workspace_id: &str) -> Result<bool>;

    fn can_switch_workspaces(&self) -> bool;

    /// Duration of the most recent enumeration
    fn last_enumeration_time(&self) -> Duration;

    fn window_count(&self) -> usize;

    fn platform_info(&self) -> String;
}

#[derive(Debug, Default)]
struct InMemoryState {
    windows: Vec<Window>,
    workspaces: Vec<Workspace>,
    platform: String,
    workspace_support: bool,
    switch_support: bool,
    enumeration_failure: Option<DeskScoutError>,
    focus_failure: Option<DeskScoutError>,
    validation_delay: Duration,
    last_enumeration: Duration,
}

/// Enumerator backed by an in-memory window list.
///
/// Used for tests and for embedders that already hold a snapshot. Focus and workspace
/// switches mutate the stored snapshot the way a real desktop would.
#[derive(Debug, Default)]
pub struct InMemoryEnumerator {
    state: RwLock<InMemoryState>,
    enumeration_calls: AtomicUsize,
    validation_calls: AtomicUsize,
    focus_calls: AtomicUsize,
    switch_calls: AtomicUsize,
}

impl InMemoryEnumerator {
    /// Create an enumerator; workspace support is enabled when workspaces are given
    pub fn new_with(windows: Vec<Window>, workspaces: Vec<Workspace>) -> Self {
        let has_workspaces = !workspaces.is_empty();
        Self {
            state: RwLock::new(InMemoryState {
                windows,
                workspaces,
                platform: "in-memory".to_string(),
                workspace_support: has_workspaces,
                switch_support: has_workspaces,
                ..InMemoryState::default()
            }),
            ..Self::default()
        }
    }

    pub fn with_platform(self, platform: impl Into<String>) -> Self {
        self.write().platform = platform.into();
        self
    }

    pub fn set_windows(&self, windows: Vec<Window>) {
        self.write().windows = windows;
    }

    pub fn set_workspaces(&self, workspaces: Vec<Workspace>) {
        let mut state = self.write();
        state.workspace_support = !workspaces.is_empty();
        state.workspaces = workspaces;
    }

    pub fn set_workspace_support(&self, supported: bool) {
        self.write().workspace_support = supported;
    }

    pub fn set_switch_support(&self, supported: bool) {
        self.write().switch_support = supported;
    }

    /// Make every enumeration call fail with `error` until cleared with `None`
    pub fn fail_enumeration(&self, error: Option<DeskScoutError>) {
        self.write().enumeration_failure = error;
    }

    pub fn fail_focus(&self, error: Option<DeskScoutError>) {
        self.write().focus_failure = error;
    }

    /// Delay applied inside `is_window_valid`, simulating a slow platform call
    pub fn set_validation_delay(&self, delay: Duration) {
        self.write().validation_delay = delay;
    }

    pub fn enumeration_calls(&self) -> usize {
        self.enumeration_calls.load(Ordering::SeqCst)
    }

    pub fn validation_calls(&self) -> usize {
        self.validation_calls.load(Ordering::SeqCst)
    }

    pub fn focus_calls(&self) -> usize {
        self.focus_calls.load(Ordering::SeqCst)
    }

    pub fn switch_calls(&self) -> usize {
        self.switch_calls.load(Ordering::SeqCst)
    }

    fn read(&self) -> RwLockReadGuard<'_, InMemoryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, InMemoryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_enumeration(&self) -> Result<()> {
        match &self.read().enumeration_failure {
            Some(err) => Err(err.clone().into()),
            None => Ok(()),
        }
    }

    fn find(&self, handle: &str) -> Option<Window> {
        self.read()
            .windows
            .iter()
            .find(|window| window.handle == handle)
            .cloned()
    }

    fn enrich(state: &InMemoryState, mut window: Window) -> Window {
        if window.workspace_name.is_empty() {
            if let Some(workspace) = state
                .workspaces
                .iter()
                .find(|ws| ws.id == window.workspace_id)
            {
                window.workspace_name = workspace.name.clone();
                window.is_on_current_workspace = workspace.is_current;
            }
        }
        window
    }
}

impl WindowEnumerator for InMemoryEnumerator {
    fn enumerate_windows(&self) -> Result<Vec<Window>> {
        self.enumeration_calls.fetch_add(1, Ordering::SeqCst);
        self.check_enumeration()?;

        let started = Instant::now();
        let windows = self.read().windows.clone();
        self.write().last_enumeration = started.elapsed();
        Ok(windows)
    }

    fn refresh_window_list(&self) -> Result<bool> {
        self.check_enumeration()?;
        Ok(true)
    }

    fn get_window_info(&self, handle: &str) -> Result<Option<Window>> {
        Ok(self.find(handle))
    }

    fn focus_window(&self, handle: &str) -> Result<bool> {
        self.focus_calls.fetch_add(1, Ordering::SeqCst);

        let mut state = self.write();
        if let Some(err) = &state.focus_failure {
            return Err(err.clone().into());
        }
        if !state.windows.iter().any(|window| window.handle == handle) {
            return Ok(false);
        }

        for window in state.windows.iter_mut() {
            if window.handle == handle {
                *window = window.clone().with_state(WindowState::Focused);
                window.is_visible = true;
            } else if window.is_focused {
                *window = window.clone().with_state(WindowState::Normal);
            }
        }
        Ok(true)
    }

    fn is_window_valid(&self, handle: &str) -> Result<bool> {
        self.validation_calls.fetch_add(1, Ordering::SeqCst);

        let delay = self.read().validation_delay;
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        Ok(self.find(handle).map_or(false, |window| window.is_valid()))
    }

    fn enumerate_workspaces(&self) -> Result<Vec<Workspace>> {
        self.check_enumeration()?;
        let state = self.read();
        if !state.workspace_support {
            return Err(DeskScoutError::Workspace {
                details: "virtual desktops are not supported".to_string(),
                degradable: true,
            }
            .into());
        }

        Ok(state
            .workspaces
            .iter()
            .map(|ws| {
                let handles = state
                    .windows
                    .iter()
                    .filter(|window| window.workspace_id == ws.id)
                    .map(|window| window.handle.clone())
                    .collect();
                ws.clone().with_windows(handles)
            })
            .collect())
    }

    fn get_current_workspace(&self) -> Result<Option<Workspace>> {
        let state = self.read();
        if !state.workspace_support {
            return Ok(None);
        }
        Ok(state.workspaces.iter().find(|ws| ws.is_current).cloned())
    }

    fn enumerate_all_workspace_windows(&self) -> Result<Vec<Window>> {
        self.enumeration_calls.fetch_add(1, Ordering::SeqCst);
        self.check_enumeration()?;

        let state = self.read();
        Ok(state
            .windows
            .iter()
            .cloned()
            .map(|window| Self::enrich(&state, window))
            .collect())
    }

    fn get_windows_on_workspace(&self, workspace_id: &str) -> Result<Vec<Window>> {
        Ok(self
            .enumerate_all_workspace_windows()?
            .into_iter()
            .filter(|window| window.workspace_id == workspace_id)
            .collect())
    }

    fn get_enhanced_window_info(&self, handle: &str) -> Result<Option<Window>> {
        let state = self.read();
        Ok(state
            .windows
            .iter()
            .find(|window| window.handle == handle)
            .cloned()
            .map(|window| Self::enrich(&state, window)))
    }

    fn is_workspace_supported(&self) -> bool {
        self.read().workspace_support
    }

    fn get_focused_window(&self) -> Result<Option<Window>> {
        Ok(self
            .read()
            .windows
            .iter()
            .find(|window| window.is_focused)
            .cloned())
    }

    fn switch_to_workspace(&self, workspace_id: &str) -> Result<bool> {
        self.switch_calls.fetch_add(1, Ordering::SeqCst);

        let mut state = self.write();
        if !state.switch_support {
            return Ok(false);
        }
        if !state.workspaces.iter().any(|ws| ws.id == workspace_id) {
            return Ok(false);
        }

        for workspace in state.workspaces.iter_mut() {
            workspace.is_current = workspace.id == workspace_id;
        }
        for window in state.windows.iter_mut() {
            window.is_on_current_workspace = window.workspace_id == workspace_id;
        }
        Ok(true)
    }

    fn can_switch_workspaces(&self) -> bool {
        let state = self.read();
        state.workspace_support && state.switch_support
    }

    fn last_enumeration_time(&self) -> Duration {
        self.read().last_enumeration
    }

    fn window_count(&self) -> usize {
        self.read().windows.len()
    }

    fn platform_info(&self) -> String {
        let state = self.read();
        format!(
            "{} ({} windows, {} workspaces)",
            state.platform,
            state.windows.len(),
            state.workspaces.len()
        )
    }
}

/// Enumerator for hosts without a native backend; every platform call fails
#[derive(Debug, Default)]
pub struct UnsupportedEnumerator;

impl UnsupportedEnumerator {
    fn unsupported<T>(&self) -> Result<T> {
        Err(DeskScoutError::PlatformNotSupported(format!(
            "no window enumerator available for {}",
            std::env::consts::OS
        ))
        .into())
    }
}

impl WindowEnumerator for UnsupportedEnumerator {
    fn enumerate_windows(&self) -> Result<Vec<Window>> {
        self.unsupported()
    }

    fn refresh_window_list(&self) -> Result<bool> {
        self.unsupported()
    }

    fn get_window_info(&self, _handle: &str) -> Result<Option<Window>> {
        self.unsupported()
    }

    fn focus_window(&self, _handle: &str) -> Result<bool> {
        self.unsupported()
    }

    fn is_window_valid(&self, _handle: &str) -> Result<bool> {
        self.unsupported()
    }

    fn enumerate_workspaces(&self) -> Result<Vec<Workspace>> {
        self.unsupported()
    }

    fn get_current_workspace(&self) -> Result<Option<Workspace>> {
        Ok(None)
    }

    fn enumerate_all_workspace_windows(&self) -> Result<Vec<Window>> {
        self.unsupported()
    }

    fn get_windows_on_workspace(&self, _workspace_id: &str) -> Result<Vec<Window>> {
        self.unsupported()
    }

    fn get_enhanced_window_info(&self, _handle: &str) -> Result<Option<Window>> {
        self.unsupported()
    }

    fn is_workspace_supported(&self) -> bool {
        false
    }

    fn get_focused_window(&self) -> Result<Option<Window>> {
        self.unsupported()
    }

    fn switch_to_workspace(&self, _workspace_id: &str) -> Result<bool> {
        Ok(false)
    }

    fn can_switch_workspaces(&self) -> bool {
        false
    }

    fn last_enumeration_time(&self) -> Duration {
        Duration::ZERO
    }

    fn window_count(&self) -> usize {
        0
    }

    fn platform_info(&self) -> String {
        format!("Unsupported platform ({})", std::env::consts::OS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> InMemoryEnumerator {
        InMemoryEnumerator::new_with(
            vec![
                Window::new("1", "Editor", 0, 0, 800, 600, true, 10, "code")
                    .on_workspace("ws1", "", true),
                Window::new("2", "Mail", 0, 0, 800, 600, false, 11, "mail")
                    .on_workspace("ws2", "", false)
                    .with_state(WindowState::Minimized),
            ],
            vec![
                Workspace::new("ws1", "Main", 0, true),
                Workspace::new("ws2", "Comms", 1, false),
            ],
        )
    }

    #[test]
    fn focus_moves_focus_flag_and_restores() {
        let enumerator = sample();
        assert!(enumerator.focus_window("2").unwrap());

        let focused = enumerator.get_focused_window().unwrap().unwrap();
        assert_eq!(focused.handle, "2");
        assert!(!focused.is_minimized);
        assert!(!enumerator.focus_window("missing").unwrap());
        assert_eq!(enumerator.focus_calls(), 2);
    }

    #[test]
    fn switching_workspace_updates_membership() {
        let enumerator = sample();
        assert!(enumerator.switch_to_workspace("ws2").unwrap());

        let current = enumerator.get_current_workspace().unwrap().unwrap();
        assert_eq!(current.id, "ws2");
        let mail = enumerator.get_window_info("2").unwrap().unwrap();
        assert!(mail.is_on_current_workspace);
        assert!(!enumerator.switch_to_workspace("nope").unwrap());
    }

    #[test]
    fn enhanced_info_fills_workspace_name() {
        let enumerator = sample();
        let window = enumerator.get_enhanced_window_info("2").unwrap().unwrap();
        assert_eq!(window.workspace_name, "Comms");
        assert_eq!(enumerator.get_windows_on_workspace("ws1").unwrap().len(), 1);
    }

    #[test]
    fn injected_failure_surfaces_as_taxonomy_error() {
        let enumerator = sample();
        enumerator.fail_enumeration(Some(DeskScoutError::PermissionDenied("screen".into())));
        let err = enumerator.enumerate_windows().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DeskScoutError>(),
            Some(DeskScoutError::PermissionDenied(_))
        ));
    }

    #[test]
    fn unsupported_enumerator_reports_platform_error() {
        let enumerator = UnsupportedEnumerator;
        let err = enumerator.enumerate_windows().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DeskScoutError>(),
            Some(DeskScoutError::PlatformNotSupported(_))
        ));
        assert!(!enumerator.is_workspace_supported());
    }
}
