//! Structured logging setup for DeskScout
//!
//! Logs go to stderr by default so command output on stdout stays machine-readable.

use crate::Result;
use std::str::FromStr;
use tracing::debug;
use tracing_subscriber::{
    fmt::{self, time::UtcTime, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(format!("Invalid log level: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Invalid log format: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    Stderr,
    File,
}

impl FromStr for LogOutput {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "stderr" => Ok(LogOutput::Stderr),
            "file" => Ok(LogOutput::File),
            _ => Err(format!("Invalid log output: {}", s)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    pub output: LogOutput,
    /// Required when `output` is `File`
    pub file_path: Option<String>,
    pub include_source: bool,
    pub include_thread_names: bool,
    /// Trace-level output for the cache, filter and focus services
    pub performance_tracing: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Warn,
            format: LogFormat::Compact,
            output: LogOutput::Stderr,
            file_path: None,
            include_source: false,
            include_thread_names: false,
            performance_tracing: false,
        }
    }
}

impl LogConfig {
    /// Defaults for the command-line tool; `--verbose` lowers the level to debug
    pub fn for_cli(verbose: bool) -> Self {
        let mut config = Self::from_env();
        if verbose && config.level > LogLevel::Debug {
            config.level = LogLevel::Debug;
        }
        config
    }

    /// Read `DESKSCOUT_LOG_*` variables on top of the defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(level) = lookup("DESKSCOUT_LOG_LEVEL").and_then(|v| v.parse().ok()) {
            config.level = level;
        }
        if let Some(format) = lookup("DESKSCOUT_LOG_FORMAT").and_then(|v| v.parse().ok()) {
            config.format = format;
        }
        if let Some(output) = lookup("DESKSCOUT_LOG_OUTPUT").and_then(|v| v.parse().ok()) {
            config.output = output;
        }
        if let Some(path) = lookup("DESKSCOUT_LOG_FILE") {
            config.file_path = Some(path);
            if lookup("DESKSCOUT_LOG_OUTPUT").is_none() {
                config.output = LogOutput::File;
            }
        }
        if let Some(source) = lookup("DESKSCOUT_LOG_SOURCE") {
            config.include_source = source.eq_ignore_ascii_case("true");
        }
        if let Some(threads) = lookup("DESKSCOUT_LOG_THREADS") {
            config.include_thread_names = threads.eq_ignore_ascii_case("true");
        }
        if let Some(performance) = lookup("DESKSCOUT_LOG_PERFORMANCE") {
            config.performance_tracing = performance.eq_ignore_ascii_case("true");
        }

        config
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the configured filter.
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let writer = match (config.output, &config.file_path) {
        (LogOutput::Stderr, _) => BoxMakeWriter::new(std::io::stderr),
        (LogOutput::File, Some(path)) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            BoxMakeWriter::new(std::sync::Mutex::new(file))
        }
        (LogOutput::File, None) => {
            return Err(crate::DeskScoutError::Configuration {
                parameter: "DESKSCOUT_LOG_FILE".to_string(),
                issue: "file path required for file output".to_string(),
            }
            .into())
        }
    };

    let filter = create_filter(config);
    tracing_subscriber::registry()
        .with(create_layer(config, writer).with_filter(filter))
        .try_init()?;

    debug!(?config, "Logging initialized");
    Ok(())
}

fn create_filter(config: &LogConfig) -> EnvFilter {
    let mut directives = format!("deskscout={}", config.level.as_directive());
    if config.performance_tracing {
        directives.push_str(",deskscout::services::window_cache=trace");
        directives.push_str(",deskscout::services::search_engine=trace");
        directives.push_str(",deskscout::services::focus_coordinator=trace");
    }

    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives))
}

fn create_layer(config: &LogConfig, writer: BoxMakeWriter) -> BoxedLayer {
    let base = fmt::layer()
        .with_writer(writer)
        .with_timer(UtcTime::rfc_3339())
        .with_thread_names(config.include_thread_names)
        .with_file(config.include_source)
        .with_line_number(config.include_source);

    match config.format {
        LogFormat::Pretty => Box::new(base.pretty()),
        LogFormat::Compact => Box::new(base.compact()),
        LogFormat::Json => Box::new(base.json()),
    }
}

/// Time a block and log its duration under `operation`
#[macro_export]
macro_rules! trace_performance {
    ($name:expr, $block:block) => {{
        let start = std::time::Instant::now();

        let result = $block;

        tracing::debug!(
            operation = $name,
            duration_ms = start.elapsed().as_millis() as u64,
            "Performance trace"
        );
        result
    }};
}
