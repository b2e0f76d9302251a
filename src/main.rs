//! Azure DevOps work item automation CLI
//!
//! Parses the command line, wires up the shared metadata cache, client, and
//! resolvers, and runs one command to completion.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use azdo_workitems::cli::{self, Cli};

#[tokio::main]
async fn main() {
    // Initialize tracing subscriber with env filter
    // Defaults to "warn" so command output stays clean; override with RUST_LOG
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "azdo_workitems=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if let Err(err) = cli::run(cli).await {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}
