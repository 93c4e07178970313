//! DeskScout command-line entry point
//!
//! Loads configuration, installs logging, picks a window enumerator and runs one
//! command. The process exit code reflects the error taxonomy.

use clap::Parser;
use deskscout::{
    cli::{report_failure, CliExecutor, DeskScoutCli},
    config::ManagerConfig,
    logging::{init_logging, LogConfig},
    platform::{Snapshot, UnsupportedEnumerator, WindowEnumerator},
    services::WindowManager,
    DeskScoutError, Result,
};
use std::sync::Arc;
use tracing::{debug, info, instrument};

#[tokio::main]
async fn main() {
    let cli = DeskScoutCli::parse();
    let format = cli.format;

    if let Err(e) = init_logging(&LogConfig::for_cli(cli.verbose)) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => report_failure(&e, format, &mut std::io::stdout()),
    };
    std::process::exit(code);
}

#[instrument(skip_all)]
async fn run(cli: DeskScoutCli) -> Result<i32> {
    info!("DeskScout v{}", env!("CARGO_PKG_VERSION"));

    let config = ManagerConfig::load_or_default(cli.config.as_deref()).map_err(|e| {
        DeskScoutError::Configuration {
            parameter: "config".to_string(),
            issue: e.to_string(),
        }
    })?;
    config.validate()?;

    let enumerator = build_enumerator(&cli)?;
    debug!(platform = %enumerator.platform_info(), "Enumerator ready");

    let manager = Arc::new(WindowManager::with_config(enumerator, config));
    let executor = CliExecutor::new(manager, cli.format, cli.verbose);

    let mut stdout = std::io::stdout();
    let outcome = executor.execute(cli.command, &mut stdout).await?;
    Ok(outcome.exit_code())
}

/// Snapshot-backed enumerator when `--snapshot` is given; there is no native backend
fn build_enumerator(cli: &DeskScoutCli) -> Result<Arc<dyn WindowEnumerator>> {
    match &cli.snapshot {
        Some(path) => {
            let snapshot = Snapshot::load(path)?;
            info!(
                path = %path.display(),
                windows = snapshot.windows.len(),
                workspaces = snapshot.workspaces.len(),
                "Loaded desktop snapshot"
            );
            Ok(Arc::new(snapshot.into_enumerator()))
        }
        None => {
            debug!("No snapshot given; using the unsupported-platform enumerator");
            Ok(Arc::new(UnsupportedEnumerator))
        }
    }
}
