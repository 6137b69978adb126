//! `nebula` entry point.

use std::process::ExitCode;

use app::Config;
use app::cli::{self, Cli};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = Config::from_env();

    // Logs go to stderr so command output stays pipeable.
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!(api_base_url = %config.api_base_url, "starting");
    let ctx = app::create_context(config);
    if let Err(e) = ctx.session().restore().await {
        tracing::warn!(error = %e, "could not restore session");
    }

    match cli::run(cli, &ctx).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
