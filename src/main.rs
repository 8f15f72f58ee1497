mod application;
mod checks;
mod cli;
mod config;
mod github;
mod infrastructure;
mod local;
mod runner;
#[cfg(test)]
mod testing;

use std::env;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // .env is optional
    dotenvy::dotenv().ok();

    // Guard flushes the file writer on exit
    let _guard = init_tracing(cli.log_json);

    info!(version = env!("CARGO_PKG_VERSION"), "Starting repo-audit");

    runner::run(cli)
}

/// Console output (plain or JSON) plus an optional daily log file under `AUDIT_LOG_DIR`
fn init_tracing(json: bool) -> Option<WorkerGuard> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());

    let (file_layer, guard) = match env::var("AUDIT_LOG_DIR") {
        Ok(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "repo-audit.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        Err(_) => (None, None),
    };

    let json_layer = json.then(|| tracing_subscriber::fmt::layer().json());
    let plain_layer = (!json).then(|| tracing_subscriber::fmt::layer());

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(plain_layer)
        .with(file_layer)
        .init();

    guard
}
