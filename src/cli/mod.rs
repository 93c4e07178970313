//! Command-line interface for DeskScout
//!
//! Lists, searches, focuses and validates windows through the [`WindowManager`]
//! facade. Results go to stdout as text or JSON; diagnostics go to the log.

use crate::error_recovery::{classify_error, exit_code, suggestion};
use crate::models::{FilterResult, SearchQuery, Window};
use crate::services::WindowManager;
use crate::{trace_performance, DeskScoutError, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Exit status for a command that ran but reported failure
pub const EXIT_FAILURE: i32 = 1;

/// DeskScout command-line interface
#[derive(Parser, Debug)]
#[command(name = "deskscout")]
#[command(about = "Search desktop windows across workspaces and bring them to front")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct DeskScoutCli {
    /// Enable verbose output and debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,

    /// JSON snapshot of windows and workspaces to serve instead of a live desktop
    #[arg(long, global = true)]
    pub snapshot: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Options shared by the listing commands
#[derive(clap::Args, Debug, Clone, Copy, Default)]
pub struct ListingOptions {
    /// Print the window handle under each entry
    #[arg(long)]
    pub show_handles: bool,

    /// Print only the handles, one per line
    #[arg(long, conflicts_with = "show_handles")]
    pub handles_only: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List visible windows grouped by workspace
    List {
        #[command(flatten)]
        listing: ListingOptions,
    },

    /// Search windows by title or owner
    Search {
        keyword: String,

        /// Match case exactly
        #[arg(long)]
        case_sensitive: bool,

        #[command(flatten)]
        listing: ListingOptions,
    },

    /// Bring a window to the front
    Focus {
        handle: String,

        /// Fail instead of switching to the window's workspace
        #[arg(long)]
        no_workspace_switch: bool,
    },

    /// Check whether a handle still refers to a live window
    ValidateHandle {
        handle: String,

        /// Give up after this many seconds
        #[arg(long)]
        timeout: Option<f64>,
    },
}

/// Whether a command that ran to completion succeeded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Success,
    Failure,
}

impl CommandOutcome {
    pub fn exit_code(self) -> i32 {
        match self {
            CommandOutcome::Success => 0,
            CommandOutcome::Failure => EXIT_FAILURE,
        }
    }
}

/// Executes parsed commands against a [`WindowManager`]
pub struct CliExecutor {
    manager: Arc<WindowManager>,
    format: OutputFormat,
    verbose: bool,
}

impl CliExecutor {
    pub fn new(manager: Arc<WindowManager>, format: OutputFormat, verbose: bool) -> Self {
        Self {
            manager,
            format,
            verbose,
        }
    }

    /// Run `command`, writing its output to `out`.
    ///
    /// Hard engine failures are returned as errors; a focus or validation that
    /// comes back negative is a [`CommandOutcome::Failure`].
    pub async fn execute<W: Write>(&self, command: Commands, out: &mut W) -> Result<CommandOutcome> {
        match command {
            Commands::List { listing } => self.list(listing, out).await,
            Commands::Search {
                keyword,
                case_sensitive,
                listing,
            } => {
                let query = SearchQuery::new(keyword).case_sensitive(case_sensitive);
                self.search(&query, listing, out).await
            }
            Commands::Focus {
                handle,
                no_workspace_switch,
            } => self.focus(&handle, !no_workspace_switch, out).await,
            Commands::ValidateHandle { handle, timeout } => {
                self.validate(&handle, timeout, out).await
            }
        }
    }

    async fn list<W: Write>(&self, listing: ListingOptions, out: &mut W) -> Result<CommandOutcome> {
        let result = self
            .manager
            .search_windows_with_workspaces(&SearchQuery::new(""))
            .await?;
        info!(count = result.filtered_count, "Listed windows");

        if listing.handles_only {
            self.write_handles(&result.windows, out)?;
        } else {
            match self.format {
                OutputFormat::Json => {
                    writeln!(out, "{}", serde_json::to_string_pretty(&result.to_json_with_workspaces())?)?
                }
                OutputFormat::Text => write_window_list(&result, listing.show_handles, out)?,
            }
        }

        self.write_metrics(out).await?;
        Ok(CommandOutcome::Success)
    }

    async fn search<W: Write>(
        &self,
        query: &SearchQuery,
        listing: ListingOptions,
        out: &mut W,
    ) -> Result<CommandOutcome> {
        let result = trace_performance!("cli_search", {
            self.manager.search_windows_with_query(query).await?
        });
        info!(
            query = %query.query,
            matches = result.filtered_count,
            "Search completed"
        );

        if listing.handles_only {
            self.write_handles(&result.windows, out)?;
        } else {
            match self.format {
                OutputFormat::Json => {
                    writeln!(out, "{}", serde_json::to_string_pretty(&result.to_json())?)?
                }
                OutputFormat::Text if result.windows.is_empty() => {
                    writeln!(out, "No windows found matching '{}'", query.query)?;
                    writeln!(out)?;
                    writeln!(out, "Tips:")?;
                    writeln!(out, "  - Try a shorter or more general keyword")?;
                    writeln!(out, "  - Check that the application is running")?;
                    writeln!(out, "  - Use 'list' to see every visible window")?;
                }
                OutputFormat::Text => {
                    writeln!(out, "{}", result.summary())?;
                    for window in &result.windows {
                        write_window(window, listing.show_handles, out)?;
                    }
                    if !result.meets_performance_target() {
                        writeln!(
                            out,
                            "\nWarning: search took {}ms",
                            result.search_time.as_millis()
                        )?;
                    }
                }
            }
        }

        self.write_metrics(out).await?;
        Ok(CommandOutcome::Success)
    }

    async fn focus<W: Write>(
        &self,
        handle: &str,
        allow_workspace_switch: bool,
        out: &mut W,
    ) -> Result<CommandOutcome> {
        let focused = self
            .manager
            .focus_window_by_handle(handle, allow_workspace_switch)
            .await;
        let operation = self.manager.get_last_focus_operation().await;

        match self.format {
            OutputFormat::Json => {
                let body = match &operation {
                    Some(op) => op.to_json(),
                    None => json!({ "windowHandle": handle, "status": "FAILED" }),
                };
                writeln!(out, "{}", serde_json::to_string_pretty(&body)?)?;
            }
            OutputFormat::Text => {
                if focused {
                    let switched = operation.as_ref().map_or(false, |op| op.workspace_switched);
                    write!(out, "Focused window {}", handle)?;
                    if switched {
                        write!(out, " (switched workspace)")?;
                    }
                    writeln!(out)?;
                } else {
                    writeln!(out, "Failed to focus window {}", handle)?;
                    if let Some(op) = &operation {
                        if !op.error_message.is_empty() {
                            writeln!(out, "  Reason: {}", op.error_message)?;
                        }
                        if let Some(remediation) = &op.remediation {
                            writeln!(out, "  Suggestion: {}", remediation)?;
                        }
                    }
                }
            }
        }

        Ok(if focused {
            CommandOutcome::Success
        } else {
            CommandOutcome::Failure
        })
    }

    async fn validate<W: Write>(
        &self,
        handle: &str,
        timeout: Option<f64>,
        out: &mut W,
    ) -> Result<CommandOutcome> {
        let valid = match timeout {
            Some(seconds) => {
                let timeout = parse_timeout(seconds)?;
                self.manager
                    .validate_handle_with_timeout(handle, timeout)
                    .await
            }
            None => self.manager.validate_handle(handle).await,
        };
        debug!(handle, valid, "Handle validated");

        match self.format {
            OutputFormat::Json => {
                let body = json!({ "handle": handle, "valid": valid });
                writeln!(out, "{}", serde_json::to_string_pretty(&body)?)?;
            }
            OutputFormat::Text => {
                let verdict = if valid { "valid" } else { "invalid" };
                writeln!(out, "Handle {} is {}", handle, verdict)?;
            }
        }

        Ok(if valid {
            CommandOutcome::Success
        } else {
            CommandOutcome::Failure
        })
    }

    fn write_handles<W: Write>(&self, windows: &[Window], out: &mut W) -> Result<()> {
        let handles: Vec<&str> = windows.iter().map(|w| w.handle.as_str()).collect();
        match self.format {
            OutputFormat::Json => writeln!(out, "{}", serde_json::to_string(&handles)?)?,
            OutputFormat::Text => {
                for handle in handles {
                    writeln!(out, "{}", handle)?;
                }
            }
        }
        Ok(())
    }

    async fn write_metrics<W: Write>(&self, out: &mut W) -> Result<()> {
        if self.verbose && self.format == OutputFormat::Text {
            let metrics = self.manager.get_performance_metrics().await;
            writeln!(out, "\nPerformance:\n{}", metrics)?;
        }
        Ok(())
    }
}

fn parse_timeout(seconds: f64) -> Result<Duration> {
    let invalid = |issue: String| DeskScoutError::Configuration {
        parameter: "timeout".to_string(),
        issue,
    };
    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(invalid(format!(
            "must be a positive number of seconds, got {}",
            seconds
        ))
        .into());
    }
    Duration::try_from_secs_f64(seconds)
        .map_err(|err| invalid(format!("{} is out of range: {}", seconds, err)).into())
}

fn write_window<W: Write>(window: &Window, show_handle: bool, out: &mut W) -> Result<()> {
    write!(out, "  {}", window.short_description())?;
    if show_handle {
        write!(out, "\n    Handle: {}", window.handle)?;
    }
    writeln!(out)?;
    Ok(())
}

fn write_window_list<W: Write>(result: &FilterResult, show_handles: bool, out: &mut W) -> Result<()> {
    if result.windows.is_empty() {
        writeln!(out, "No windows found.")?;
        return Ok(());
    }

    writeln!(out, "Windows ({} total):", result.filtered_count)?;
    if result.workspaces.len() > 1 {
        for workspace in &result.workspaces {
            let Some(windows) = result.windows_by_workspace.get(&workspace.id) else {
                continue;
            };
            let marker = if workspace.is_current { " [Current]" } else { "" };
            writeln!(out, "\n{}{}:", workspace.name, marker)?;
            for window in windows {
                write_window(window, show_handles, out)?;
            }
        }
    } else {
        for window in &result.windows {
            write_window(window, show_handles, out)?;
        }
    }
    Ok(())
}

/// Render a failure for the user and pick the process exit code
pub fn report_failure<W: Write>(err: &anyhow::Error, format: OutputFormat, out: &mut W) -> i32 {
    let classified = classify_error(err, DeskScoutError::WindowEnumeration);
    let written = match format {
        OutputFormat::Json => {
            let body = json!({
                "error": err.to_string(),
                "suggestion": suggestion(&classified),
            });
            writeln!(out, "{}", body)
        }
        OutputFormat::Text => writeln!(
            out,
            "Error: {}\n  Suggestion: {}",
            err,
            suggestion(&classified)
        ),
    };
    if let Err(write_err) = written {
        debug!(error = %write_err, "Failed to write error report");
    }
    exit_code(err)
}
