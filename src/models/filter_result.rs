//! Filter results with workspace grouping and statistics

use crate::models::search_query::SearchQuery;
use crate::models::window::Window;
use crate::models::workspace::Workspace;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::Duration;

/// Soft latency target for a single filter pass
pub const SEARCH_PERFORMANCE_TARGET: Duration = Duration::from_millis(1000);

/// Cross-workspace statistics derived from a result
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceStatistics {
    pub total_workspaces: usize,
    pub total_windows: usize,
    /// Workspaces with at least one matched window
    pub active_workspaces: usize,
    pub visible_windows: usize,
    pub minimized_windows: usize,
    pub focused_windows: usize,
    /// Matched windows that are not visible
    pub hidden_windows: usize,
    /// Matched windows per active workspace
    pub average_windows_per_workspace: f64,
    /// Matched window count per workspace id
    pub windows_by_workspace: BTreeMap<String, usize>,
}

/// Outcome of one filter pass
#[derive(Debug, Clone, PartialEq)]
pub struct FilterResult {
    /// Matched windows, sorted by title then process id up to 1000 matches
    pub windows: Vec<Window>,
    /// Windows considered before filtering
    pub total_count: usize,
    /// Always `windows.len()`
    pub filtered_count: usize,
    /// Time spent matching
    pub search_time: Duration,
    pub query: SearchQuery,
    /// Workspace list, attached by the workspace-aware search only
    pub workspaces: Vec<Workspace>,
    /// Matched windows grouped by workspace id
    pub windows_by_workspace: BTreeMap<String, Vec<Window>>,
}

impl FilterResult {
    /// Build a result; `filtered_count` always equals `windows.len()` and the total
    /// never drops below it
    pub fn new(windows: Vec<Window>, total: usize, query: SearchQuery, search_time: Duration) -> Self {
        let filtered_count = windows.len();
        let mut result = Self {
            windows,
            total_count: total.max(filtered_count),
            filtered_count,
            search_time,
            query,
            workspaces: Vec::new(),
            windows_by_workspace: BTreeMap::new(),
        };
        result.group_by_workspace();
        result
    }

    pub fn with_workspaces(mut self, workspaces: Vec<Workspace>) -> Self {
        self.workspaces = workspaces;
        self
    }

    /// Empty result for a query that produced no matches
    pub fn empty(query: SearchQuery) -> Self {
        Self::new(Vec::new(), 0, query, Duration::ZERO)
    }

    pub fn is_valid(&self) -> bool {
        self.filtered_count == self.windows.len() && self.filtered_count <= self.total_count
    }

    pub fn filter_ratio(&self) -> f64 {
        if self.total_count == 0 {
            return 1.0;
        }
        self.filtered_count as f64 / self.total_count as f64
    }

    pub fn meets_performance_target(&self) -> bool {
        self.search_time < SEARCH_PERFORMANCE_TARGET
    }

    fn group_by_workspace(&mut self) {
        self.windows_by_workspace.clear();
        for window in &self.windows {
            self.windows_by_workspace
                .entry(window.workspace_id.clone())
                .or_default()
                .push(window.clone());
        }
    }

    pub fn workspace_count(&self) -> usize {
        self.windows_by_workspace.len()
    }

    pub fn workspace_ids(&self) -> Vec<String> {
        self.windows_by_workspace.keys().cloned().collect()
    }

    pub fn window_count_for_workspace(&self, workspace_id: &str) -> usize {
        self.windows_by_workspace
            .get(workspace_id)
            .map_or(0, Vec::len)
    }

    pub fn visible_window_count(&self) -> usize {
        self.windows.iter().filter(|w| w.is_visible).count()
    }

    pub fn minimized_window_count(&self) -> usize {
        self.windows.iter().filter(|w| w.is_minimized).count()
    }

    pub fn focused_window_count(&self) -> usize {
        self.windows.iter().filter(|w| w.is_focused).count()
    }

    pub fn hidden_window_count(&self) -> usize {
        self.windows.iter().filter(|w| !w.is_visible).count()
    }

    /// Workspaces from the attached list that hold at least one matched window
    pub fn active_workspace_count(&self) -> usize {
        self.workspaces
            .iter()
            .filter(|ws| self.window_count_for_workspace(&ws.id) > 0)
            .count()
    }

    pub fn average_windows_per_workspace(&self) -> f64 {
        match self.active_workspace_count() {
            0 => 0.0,
            active => self.filtered_count as f64 / active as f64,
        }
    }

    pub fn workspace_distribution(&self) -> BTreeMap<String, usize> {
        self.workspaces
            .iter()
            .map(|ws| (ws.id.clone(), self.window_count_for_workspace(&ws.id)))
            .collect()
    }

    pub fn workspace_statistics(&self) -> WorkspaceStatistics {
        WorkspaceStatistics {
            total_workspaces: self.workspaces.len(),
            total_windows: self.windows.len(),
            active_workspaces: self.active_workspace_count(),
            visible_windows: self.visible_window_count(),
            minimized_windows: self.minimized_window_count(),
            focused_windows: self.focused_window_count(),
            hidden_windows: self.hidden_window_count(),
            average_windows_per_workspace: self.average_windows_per_workspace(),
            windows_by_workspace: self.workspace_distribution(),
        }
    }

    pub fn summary(&self) -> String {
        let mut summary = if self.query.is_empty() {
            format!("All windows ({} total)", self.filtered_count)
        } else if self.filtered_count == 0 {
            format!(
                "Windows (0 of {}) - No matches found for '{}'",
                self.total_count, self.query.query
            )
        } else {
            format!(
                "Windows ({} of {}) matching '{}'",
                self.filtered_count, self.total_count, self.query.query
            )
        };

        if !self.windows_by_workspace.is_empty() {
            summary.push_str(&format!(" across {} workspaces", self.windows_by_workspace.len()));
        }

        summary.push_str(&format!(
            "\nSearch completed in {}ms",
            self.search_time.as_millis()
        ));
        if !self.meets_performance_target() {
            summary.push_str(" (WARNING: Exceeded 1 second performance target)");
        }
        summary
    }

    pub fn workspace_stats_summary(&self) -> String {
        let mut out = String::from("Workspace Distribution:\n");
        for workspace in &self.workspaces {
            let count = self.window_count_for_workspace(&workspace.id);
            if count == 0 {
                continue;
            }
            out.push_str(&format!(
                "  {} ({}): {} windows",
                workspace.name, workspace.id, count
            ));
            if workspace.is_current {
                out.push_str(" [Current]");
            }
            out.push('\n');
        }
        out
    }

    pub fn to_json(&self) -> Value {
        json!({
            "windows": self.windows,
            "metadata": {
                "totalCount": self.total_count,
                "filteredCount": self.filtered_count,
                "searchTime": self.search_time.as_millis() as u64,
                "query": self.query.query,
                "timestamp": timestamp(),
            }
        })
    }

    pub fn to_json_with_workspaces(&self) -> Value {
        let workspaces: Vec<Value> = self
            .workspaces
            .iter()
            .map(|ws| {
                let windows = self
                    .windows_by_workspace
                    .get(&ws.id)
                    .cloned()
                    .unwrap_or_default();
                json!({
                    "id": ws.id,
                    "name": ws.name,
                    "index": ws.index,
                    "isCurrent": ws.is_current,
                    "windowCount": windows.len(),
                    "windows": windows,
                })
            })
            .collect();

        json!({
            "metadata": {
                "totalCount": self.total_count,
                "filteredCount": self.filtered_count,
                "searchTime": self.search_time.as_millis() as u64,
                "workspaceCount": self.workspace_count(),
                "query": {
                    "text": self.query.query,
                    "field": self.query.field.to_string(),
                    "caseSensitive": self.query.case_sensitive,
                    "useRegex": self.query.use_regex,
                },
                "statistics": {
                    "visibleWindows": self.visible_window_count(),
                    "minimizedWindows": self.minimized_window_count(),
                    "focusedWindows": self.focused_window_count(),
                    "hiddenWindows": self.hidden_window_count(),
                    "workspaceDistribution": self.workspace_distribution(),
                    "performance": {
                        "filterRatio": self.filter_ratio(),
                        "meetsTarget": self.meets_performance_target(),
                    }
                },
                "timestamp": timestamp(),
            },
            "workspaces": workspaces,
        })
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::window::WindowState;

    fn window(handle: &str, workspace: &str, state: WindowState, visible: bool) -> Window {
        Window::new(handle, format!("win {handle}"), 0, 0, 100, 100, visible, 1, "app")
            .on_workspace(workspace, workspace.to_uppercase(), workspace == "ws1")
            .with_state(state)
    }

    fn sample() -> FilterResult {
        let windows = vec![
            window("1", "ws1", WindowState::Focused, true),
            window("2", "ws1", WindowState::Normal, true),
            window("3", "ws2", WindowState::Minimized, false),
        ];
        FilterResult::new(windows, 10, SearchQuery::new("win"), Duration::from_millis(3))
            .with_workspaces(vec![
                Workspace::new("ws1", "WS1", 0, true),
                Workspace::new("ws2", "WS2", 1, false),
                Workspace::new("ws3", "WS3", 2, false),
            ])
    }

    #[test]
    fn counts_hold_invariant_even_with_understated_total() {
        let result = FilterResult::new(
            vec![window("1", "ws1", WindowState::Normal, true)],
            0,
            SearchQuery::default(),
            Duration::ZERO,
        );
        assert_eq!(result.filtered_count, 1);
        assert_eq!(result.total_count, 1);
        assert!(result.is_valid());
    }

    #[test]
    fn statistics_cover_states_and_active_workspaces() {
        let stats = sample().workspace_statistics();
        assert_eq!(stats.total_workspaces, 3);
        assert_eq!(stats.total_windows, 3);
        assert_eq!(stats.active_workspaces, 2);
        assert_eq!(stats.visible_windows, 2);
        assert_eq!(stats.hidden_windows, 1);
        assert_eq!(stats.minimized_windows, 1);
        assert_eq!(stats.focused_windows, 1);
        assert!((stats.average_windows_per_workspace - 1.5).abs() < f64::EPSILON);
        assert_eq!(stats.windows_by_workspace.get("ws3"), Some(&0));
    }

    #[test]
    fn grouping_follows_workspace_ids() {
        let result = sample();
        assert_eq!(result.workspace_ids(), vec!["ws1".to_string(), "ws2".to_string()]);
        assert_eq!(result.window_count_for_workspace("ws1"), 2);
        assert_eq!(result.window_count_for_workspace("missing"), 0);
    }

    #[test]
    fn summary_reports_no_matches() {
        let result = FilterResult::new(Vec::new(), 4, SearchQuery::new("zzz"), Duration::ZERO);
        assert!(result.summary().contains("No matches found for 'zzz'"));
        assert!(result.meets_performance_target());
    }

    #[test]
    fn slow_search_is_flagged_but_valid() {
        let mut result = sample();
        result.search_time = Duration::from_millis(1500);
        assert!(!result.meets_performance_target());
        assert!(result.is_valid());
        assert!(result.summary().contains("WARNING"));
    }

    #[test]
    fn json_with_workspaces_lists_every_workspace() {
        let json = sample().to_json_with_workspaces();
        let workspaces = json["workspaces"].as_array().unwrap();
        assert_eq!(workspaces.len(), 3);
        assert_eq!(workspaces[0]["windowCount"], 2);
        assert_eq!(workspaces[2]["windowCount"], 0);
        assert_eq!(json["metadata"]["statistics"]["hiddenWindows"], 1);
    }
}
