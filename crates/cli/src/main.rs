use std::{process::ExitCode, sync::Arc};

use {
    clap::Parser,
    tracing::{error, info},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use {
    citawatch_config::{Severity, validate},
    citawatch_monitor::{Notify, RunOutcome, Watcher},
    citawatch_telegram::TelegramNotifier,
};

/// A completed run exits 0 regardless of what it found; only configuration
/// problems are non-zero.
const EXIT_CONFIG_ERROR: u8 = 2;

#[derive(Parser)]
#[command(name = "citawatch", about = "Appointment-slot watcher for the consular booking flow")]
struct Cli {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, default_value_t = false)]
    json_logs: bool,

    /// Config file path (overrides discovery).
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    /// Send a test message to the configured chat and exit.
    #[arg(long, default_value_t = false)]
    test_alert: bool,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "citawatch starting");

    let config = match cli.config {
        Some(ref path) => match citawatch_config::load_config(path) {
            Ok(config) => config,
            Err(e) => {
                error!(path = %path.display(), error = %e, "failed to load config");
                return ExitCode::from(EXIT_CONFIG_ERROR);
            },
        },
        None => citawatch_config::discover_and_load(),
    };

    let validation = validate(&config);
    for diagnostic in &validation.diagnostics {
        match diagnostic.severity {
            Severity::Error => {
                error!(path = diagnostic.path, "{}", diagnostic.message);
            },
            Severity::Warning => {
                tracing::warn!(path = diagnostic.path, "{}", diagnostic.message);
            },
        }
    }
    if validation.has_errors() {
        return ExitCode::from(EXIT_CONFIG_ERROR);
    }

    let notifier = match TelegramNotifier::new(&config.telegram) {
        Ok(notifier) => Arc::new(notifier),
        Err(e) => {
            error!(error = %e, "failed to build telegram notifier");
            return ExitCode::from(EXIT_CONFIG_ERROR);
        },
    };

    if cli.test_alert {
        return match notifier
            .send_text("citawatch test alert: configuration is working")
            .await
        {
            Ok(()) => {
                info!("test alert delivered");
                ExitCode::SUCCESS
            },
            Err(e) => {
                error!(error = %e, "test alert failed");
                ExitCode::from(EXIT_CONFIG_ERROR)
            },
        };
    }

    let watcher = Watcher::new(config, notifier);
    match watcher.run().await {
        RunOutcome::FoundAndHandled => {
            info!("run finished: terminal status handled");
            ExitCode::SUCCESS
        },
        RunOutcome::ExhaustedAttempts { classified_any } => {
            info!(classified_any, "run finished: attempts exhausted");
            ExitCode::SUCCESS
        },
        RunOutcome::FatalError(message) => {
            error!("{message}");
            ExitCode::from(EXIT_CONFIG_ERROR)
        },
    }
}
