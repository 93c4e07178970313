//! Shared fixtures: a mockall enumerator and desktop builders

use deskscout::platform::WindowEnumerator;
use deskscout::{Result, Window, WindowState, Workspace};
use mockall::mock;
use std::time::Duration;

mock! {
    pub Enumerator {}

    impl WindowEnumerator for Enumerator {
        fn enumerate_windows(&self) -> Result<Vec<Window>>;
        fn refresh_window_list(&self) -> Result<bool>;
        fn get_window_info(&self, handle: &str) -> Result<Option<Window>>;
        fn focus_window(&self, handle: &str) -> Result<bool>;
        fn is_window_valid(&self, handle: &str) -> Result<bool>;
        fn enumerate_workspaces(&self) -> Result<Vec<Workspace>>;
        fn get_current_workspace(&self) -> Result<Option<Workspace>>;
        fn enumerate_all_workspace_windows(&self) -> Result<Vec<Window>>;
        fn get_windows_on_workspace(&self, workspace_id: &str) -> Result<Vec<Window>>;
        fn get_enhanced_window_info(&self, handle: &str) -> Result<Option<Window>>;
        fn is_workspace_supported(&self) -> bool;
        fn get_focused_window(&self) -> Result<Option<Window>>;
        fn switch_to_workspace(&self, workspace_id: &str) -> Result<bool>;
        fn can_switch_workspaces(&self) -> bool;
        fn last_enumeration_time(&self) -> Duration;
        fn window_count(&self) -> usize;
        fn platform_info(&self) -> String;
    }
}

pub fn main_workspace() -> Workspace {
    Workspace::new("ws1", "Main", 0, true)
}

pub fn second_workspace() -> Workspace {
    Workspace::new("ws2", "Second", 1, false)
}

/// Visible Chrome window on the current workspace
pub fn chrome() -> Window {
    Window::new("1", "Chrome", 0, 0, 1280, 800, true, 100, "chrome.exe")
        .on_workspace("ws1", "Main", true)
}

/// Hidden terminal on the current workspace
pub fn terminal() -> Window {
    Window::new("2", "Term", 10, 10, 640, 480, false, 200, "bash")
        .on_workspace("ws1", "Main", true)
}

/// Minimized editor on the second workspace
pub fn remote_editor() -> Window {
    Window::new("3", "Notes", 0, 0, 800, 600, true, 300, "editor")
        .on_workspace("ws2", "Second", false)
        .with_state(WindowState::Minimized)
}

/// `count` synthetic windows spread across `workspaces` workspaces
pub fn synthetic_desktop(count: usize, workspaces: usize) -> (Vec<Window>, Vec<Workspace>) {
    let workspaces = workspaces.max(1);
    let spaces: Vec<Workspace> = (0..workspaces)
        .map(|i| Workspace::new(format!("ws{}", i), format!("Desktop {}", i), i, i == 0))
        .collect();
    let windows = (0..count)
        .map(|i| {
            let ws = i % workspaces;
            Window::new(
                format!("0x{:x}", i + 1),
                format!("Window {} - {}", i, ["Editor", "Browser", "Terminal", "Mail"][i % 4]),
                (i % 50) as i32 * 10,
                (i % 30) as i32 * 10,
                800,
                600,
                i % 5 != 0,
                (i + 1) as u32,
                ["code", "firefox", "bash", "thunderbird"][i % 4],
            )
            .on_workspace(format!("ws{}", ws), format!("Desktop {}", ws), ws == 0)
        })
        .collect();
    (windows, spaces)
}
