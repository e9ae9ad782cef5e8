mod cli;
mod logging;
mod table;

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};

use slotgrab_core::{
    load_config, load_config_from_env, validate_config, CommandRecognizer, Config, Credentials,
    NodeScriptEncryptor, ReservationOrchestrator, ReservationReport, ReserveError, RetryPolicy,
    SanitizedConfig, Shutdown, SubmissionOutcome, SystemClock,
};

use cli::Cli;

/// Config file picked up from the working directory when none is given.
const DEFAULT_CONFIG_FILE: &str = "slotgrab.toml";

const EXIT_SUCCESS: i32 = 0;
const EXIT_FAILURE: i32 = 1;
const EXIT_REJECTED: i32 = 2;
const EXIT_CANCELLED: i32 = 130;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("Fatal error: {:#}", e);
            eprintln!("error: {:#}", e);
            std::process::exit(EXIT_FAILURE);
        }
    }
}

fn load(explicit: Option<&Path>) -> Result<Config> {
    let config = match explicit {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => {
            let path = PathBuf::from(DEFAULT_CONFIG_FILE);
            if path.exists() {
                load_config(&path)
                    .with_context(|| format!("Failed to load config from {:?}", path))?
            } else {
                load_config_from_env().context("Failed to load config from environment")?
            }
        }
    };
    validate_config(&config).context("Configuration validation failed")?;
    Ok(config)
}

fn credentials(cli: &Cli, config: &Config) -> Result<Credentials> {
    let username = cli
        .username
        .clone()
        .or_else(|| config.account.username.clone())
        .ok_or_else(|| anyhow!("No username given (use -u or SLOTGRAB_USERNAME)"))?;
    let password = cli
        .password
        .clone()
        .or_else(|| config.account.password.clone())
        .ok_or_else(|| anyhow!("No password given (use -p or SLOTGRAB_PASSWORD)"))?;
    Ok(Credentials::new(username, password))
}

async fn run(cli: Cli) -> Result<i32> {
    let config = load(cli.config.as_deref())?;

    let log_file = logging::init(config.logging.dir.as_deref())?;
    if let Some(path) = &log_file {
        info!("Logging to {:?}", path);
    }
    info!(
        "Configuration loaded: {}",
        serde_json::to_string(&SanitizedConfig::from(&config)).unwrap_or_default()
    );

    let credentials = credentials(&cli, &config)?;

    let orchestrator = ReservationOrchestrator::new(
        &config,
        Arc::new(NodeScriptEncryptor::new(config.encryptor.clone())),
        Arc::new(CommandRecognizer::new(&config.captcha)),
        Arc::new(SystemClock),
        RetryPolicy::from_config(&config.retry),
    )?;

    let shutdown = Shutdown::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        warn!("Shutdown signal received");
        trigger.trigger();
    });

    let catalog = match orchestrator.fetch_catalog(&credentials).await {
        Ok(catalog) => catalog,
        Err(e) => return Ok(report_error(e)),
    };

    if cli.wants_listing() {
        println!("{}", table::render(&catalog, std::io::stdout().is_terminal()));
    }

    let Some(id) = cli.id.as_deref() else {
        return Ok(EXIT_SUCCESS);
    };
    let Some(activity) = catalog.get(id) else {
        return Ok(report_error(ReserveError::ActivityNotFound(id.to_string())));
    };

    match orchestrator.is_open(activity) {
        Ok(true) => println!("Booking for {} is open, reserving now", activity.name),
        Ok(false) => println!(
            "Booking for {} opens at {}, waiting (Ctrl+C to cancel)",
            activity.name, activity.opens_at_raw
        ),
        Err(e) => return Ok(report_error(e)),
    }

    match orchestrator.reserve(&credentials, activity, &shutdown).await {
        Ok(report) => Ok(report_outcome(&report)),
        Err(e) => Ok(report_error(e)),
    }
}

fn report_outcome(report: &ReservationReport) -> i32 {
    let at = report.finished_at.with_timezone(&chrono::Local);
    match &report.outcome {
        SubmissionOutcome::Success { message } => {
            info!(attempts = report.attempts, "Reservation confirmed");
            println!(
                "[{}] Reserved {} ({}): {}",
                at.format("%Y-%m-%d %H:%M:%S%.3f"),
                report.activity_name,
                report.activity_id,
                message
            );
            EXIT_SUCCESS
        }
        SubmissionOutcome::Fatal { message } => {
            println!("Reservation rejected: {}", message);
            EXIT_REJECTED
        }
        // the orchestrator only reports terminal outcomes
        SubmissionOutcome::Retryable { reason } => {
            error!(%reason, "Unexpected non-terminal outcome");
            EXIT_FAILURE
        }
    }
}

fn report_error(e: ReserveError) -> i32 {
    match &e {
        ReserveError::Cancelled { attempts } => {
            eprintln!("Cancelled after {} attempts", attempts);
            EXIT_CANCELLED
        }
        ReserveError::ActivityNotFound(id) => {
            eprintln!("No activity with id {}", id);
            EXIT_FAILURE
        }
        _ if e.is_infrastructure() => {
            error!("{}", e);
            eprintln!("Reservation failed: {}. See the log for details.", e);
            EXIT_FAILURE
        }
        _ => {
            error!("{}", e);
            eprintln!("error: {}", e);
            EXIT_FAILURE
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
