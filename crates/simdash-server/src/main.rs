//! Simdash server — entry point.

use std::sync::Arc;

use clap::{Parser, Subcommand};

use simdash_server::api::{build_router, AppState};
use simdash_server::metadata::AppMetadata;
use simdash_server::settings::Settings;

#[derive(Parser)]
#[command(
    name = "simdash-server",
    about = "HTTP server for Simdash — browser-based configuration and generation of flight-sim telemetry exports",
    version
)]
struct Cli {
    /// Directory holding templates, source models, and notices.
    #[arg(long)]
    resources: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (default).
    Serve {
        /// Listen address (host:port).
        #[arg(long)]
        addr: Option<String>,

        /// Directory of static frontend files served at the root.
        #[arg(long)]
        static_dir: Option<String>,
    },

    /// Print build metadata as JSON.
    Info,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command.unwrap_or(Commands::Serve {
        addr: None,
        static_dir: None,
    }) {
        Commands::Serve { addr, static_dir } => {
            let settings = Settings::resolve(
                cli.resources.as_deref(),
                addr.as_deref(),
                static_dir.as_deref(),
            );
            tracing::info!(
                resources = %settings.resources_dir.display(),
                addr = %settings.listen_addr,
                "starting simdash server"
            );
            let state = Arc::new(AppState::load(&settings)?);
            let router = build_router(state, &settings);
            let listener = tokio::net::TcpListener::bind(&settings.listen_addr).await?;
            axum::serve(listener, router).await?;
        }

        Commands::Info => {
            let metadata = AppMetadata::collect();
            println!("{}", serde_json::to_string_pretty(&metadata)?);
        }
    }

    Ok(())
}
