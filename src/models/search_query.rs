//! Search query model and matching rules

use crate::models::window::Window;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Maximum accepted search term length, in characters
pub const MAX_QUERY_LENGTH: usize = 1000;

/// Which window fields a query is compared against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SearchField {
    Title,
    Owner,
    #[default]
    Both,
}

impl fmt::Display for SearchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchField::Title => write!(f, "title"),
            SearchField::Owner => write!(f, "owner"),
            SearchField::Both => write!(f, "both"),
        }
    }
}

/// How the term is compared against a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum MatchMode {
    #[default]
    Contains,
    StartsWith,
    Exact,
    Regex,
}

/// A free-text window query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    /// Search term; empty matches everything
    pub query: String,
    pub field: SearchField,
    pub case_sensitive: bool,
    pub use_regex: bool,
    /// Restrict matches to one workspace id; empty means all workspaces
    pub workspace_filter: String,
    pub match_mode: MatchMode,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn with_field(mut self, field: SearchField) -> Self {
        self.field = field;
        self
    }

    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    /// Enabling regex also switches the match mode to `Regex`
    pub fn regex(mut self, use_regex: bool) -> Self {
        self.use_regex = use_regex;
        self.match_mode = if use_regex {
            MatchMode::Regex
        } else {
            MatchMode::Contains
        };
        self
    }

    pub fn in_workspace(mut self, workspace_id: impl Into<String>) -> Self {
        self.workspace_filter = workspace_id.into();
        self
    }

    pub fn with_match_mode(mut self, mode: MatchMode) -> Self {
        self.match_mode = mode;
        self.use_regex = mode == MatchMode::Regex;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.query.is_empty()
    }

    /// Term within the length limit and, in regex mode, a pattern that compiles
    pub fn is_valid(&self) -> bool {
        if self.query.chars().count() > MAX_QUERY_LENGTH {
            return false;
        }
        if self.uses_regex() && !self.query.is_empty() {
            return self.build_regex().is_ok();
        }
        true
    }

    /// Compile the query once for repeated matching
    pub fn matcher(&self) -> QueryMatcher<'_> {
        QueryMatcher::new(self)
    }

    pub fn matches(&self, window: &Window) -> bool {
        self.matcher().matches(window)
    }

    pub fn matches_title(&self, title: &str) -> bool {
        self.matcher().matches_text(title)
    }

    pub fn matches_owner(&self, owner: &str) -> bool {
        self.matcher().matches_text(owner)
    }

    fn uses_regex(&self) -> bool {
        self.use_regex || self.match_mode == MatchMode::Regex
    }

    fn build_regex(&self) -> std::result::Result<Regex, regex::Error> {
        RegexBuilder::new(&self.query)
            .case_insensitive(!self.case_sensitive)
            .build()
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SearchQuery{{query='{}', field={}, caseSensitive={}, useRegex={}",
            self.query, self.field, self.case_sensitive, self.use_regex
        )?;
        if !self.workspace_filter.is_empty() {
            write!(f, ", workspaceFilter='{}'", self.workspace_filter)?;
        }
        write!(f, "}}")
    }
}

/// A query with its term folded and its pattern compiled
pub struct QueryMatcher<'a> {
    query: &'a SearchQuery,
    needle: String,
    regex: Option<Regex>,
}

impl<'a> QueryMatcher<'a> {
    fn new(query: &'a SearchQuery) -> Self {
        let regex = if query.uses_regex() && !query.query.is_empty() {
            match query.build_regex() {
                Ok(regex) => Some(regex),
                Err(err) => {
                    debug!(
                        pattern = %query.query,
                        error = %err,
                        "Invalid regex, falling back to substring match"
                    );
                    None
                }
            }
        } else {
            None
        };

        Self {
            query,
            needle: fold(&query.query, query.case_sensitive),
            regex,
        }
    }

    pub fn matches(&self, window: &Window) -> bool {
        if self.query.is_empty() {
            return true;
        }

        if !self.query.workspace_filter.is_empty()
            && window.workspace_id != self.query.workspace_filter
        {
            return false;
        }

        match self.query.field {
            SearchField::Title => self.matches_text(&window.title),
            SearchField::Owner => self.matches_text(&window.owner_name),
            SearchField::Both => {
                self.matches_text(&window.title) || self.matches_text(&window.owner_name)
            }
        }
    }

    pub fn matches_text(&self, text: &str) -> bool {
        if self.query.is_empty() {
            return true;
        }

        if let Some(regex) = &self.regex {
            return regex.is_match(text);
        }

        let haystack = fold(text, self.query.case_sensitive);
        match self.query.match_mode {
            MatchMode::StartsWith => haystack.starts_with(&self.needle),
            MatchMode::Exact => haystack == self.needle,
            MatchMode::Contains | MatchMode::Regex => haystack.contains(&self.needle),
        }
    }
}

fn fold(text: &str, case_sensitive: bool) -> String {
    if case_sensitive {
        text.to_string()
    } else {
        text.to_lowercase()
    }
}
