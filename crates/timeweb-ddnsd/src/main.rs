// # timeweb-ddnsd
//
// Command-line front end for the Timeweb panel DDNS updater.
//
// This binary is a thin integration layer: it loads configuration, builds the
// resolver, browser launcher and state store, and hands them to the
// `DdnsEngine` from `timeweb-ddns-core`. All update logic lives there.
//
// ## Usage
//
// ```bash
// timeweb-ddnsd                # interactive menu
// timeweb-ddnsd auto           # check every `check_interval_minutes` until stopped
// timeweb-ddnsd force-update   # push the current IP to every domain once
// ```
//
// ## Configuration
//
// `<DATA_DIR>/config.json` (default `data/config.json`), overridden by:
//
// - `TIMEWEB_LOGIN`, `TIMEWEB_PASSWORD`: panel credentials
// - `TIMEWEB_DOMAINS`: comma-separated list of domains
// - `DATA_DIR`: where config, cached IP, cookies and screenshots live
// - `TIMEWEB_DDNS_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// A `.env` file in the working directory is loaded first.

mod console;
mod menu;
mod setup;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

use timeweb_ddns_core::state::FileStateStore;
use timeweb_ddns_core::{DataPaths, DdnsConfig, DdnsEngine, Diagnostics, Error};
use timeweb_ddns_ip_http::HttpIpResolver;
use timeweb_ddns_webdriver::WebDriverLauncher;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Environment variable selecting the log level
const LOG_LEVEL_ENV: &str = "TIMEWEB_DDNS_LOG_LEVEL";

/// Exit codes for different termination scenarios
///
/// - 0: Clean exit
/// - 1: Configuration error
/// - 2: Runtime error, or a forced update that did not succeed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DdnsExitCode {
    CleanShutdown = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Keep Timeweb hosting-panel A-records pointed at this machine's public IP
#[derive(Debug, Parser)]
#[command(name = "timeweb-ddnsd", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
enum Command {
    /// Check the IP periodically and update records when it changes
    Auto,
    /// Push the current IP to every domain once, even if it did not change
    ForceUpdate,
}

fn parse_log_level(raw: &str) -> Level {
    match raw.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() {
                DdnsExitCode::ConfigError
            } else {
                DdnsExitCode::CleanShutdown
            };
            let _ = e.print();
            return code.into();
        }
    };

    dotenvy::dotenv().ok();

    let log_level = parse_log_level(&std::env::var(LOG_LEVEL_ENV).unwrap_or_default());
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    let code = rt.block_on(async {
        match run(cli.command).await {
            Ok(code) => code,
            Err(e) => {
                error!("{:#}", e);
                match e.downcast_ref::<Error>() {
                    Some(Error::ConfigurationMissing(_)) | Some(Error::Config(_)) => {
                        DdnsExitCode::ConfigError
                    }
                    _ => DdnsExitCode::RuntimeError,
                }
            }
        }
    });

    code.into()
}

/// Load configuration, prompting for it when running interactively
fn load_config(paths: &DataPaths) -> Result<DdnsConfig> {
    let file_config = DdnsConfig::load(&paths.config_file())?;
    let mut config = file_config.clone();
    config.apply_env_overrides();

    if !config.has_credentials() {
        if !std::io::stdin().is_terminal() {
            config.require_credentials()?;
        }
        let mut console = console::Console::stdio();
        config = setup::initial_setup(&mut console, file_config, &paths.config_file())
            .context("Initial setup failed")?;
        config.apply_env_overrides();
    }

    config.validate()?;
    Ok(config)
}

async fn run(command: Option<Command>) -> Result<DdnsExitCode> {
    let paths = DataPaths::from_env();
    info!("Using data directory {}", paths.data_dir().display());

    let config = load_config(&paths)?;
    info!("Configuration loaded: {} domain(s)", config.domains.len());

    let store = FileStateStore::new(&paths).await?;
    let mut engine = DdnsEngine::new(
        Box::new(HttpIpResolver::new()?),
        Box::new(WebDriverLauncher::from_config(&config)),
        Arc::new(store),
        config,
        Diagnostics::from_paths(&paths),
    )?;

    match command {
        Some(Command::Auto) => {
            let interval = engine.config().check_interval();
            let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
            tokio::spawn(async move {
                match wait_for_shutdown().await {
                    Ok(signal) => info!("Received {}", signal),
                    Err(e) => error!("Signal handling failed: {}", e),
                }
                let _ = shutdown_tx.send(());
            });

            engine
                .run_auto_mode_with_shutdown(interval, Some(shutdown_rx))
                .await?;
            Ok(DdnsExitCode::CleanShutdown)
        }
        Some(Command::ForceUpdate) => {
            let outcome = engine.run_update(true).await?;
            if outcome.is_success() {
                Ok(DdnsExitCode::CleanShutdown)
            } else {
                Ok(DdnsExitCode::RuntimeError)
            }
        }
        None => {
            let mut console = console::Console::stdio();
            menu::main_menu(&mut console, &mut engine, &paths).await?;
            Ok(DdnsExitCode::CleanShutdown)
        }
    }
}

/// Wait for SIGTERM or SIGINT
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm =
        signal(SignalKind::terminate()).context("Failed to setup SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("Failed to setup SIGINT handler")?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for Ctrl-C
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .context("Failed to wait for Ctrl-C")?;
    Ok("Ctrl-C")
}
