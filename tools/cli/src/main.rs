//! DriveBridge - relay HTTP file uploads into a Google Drive folder.
//!
//! Configuration comes from the environment (see `ServerConfig::from_env`);
//! a `.env` file is honored when present. Configuration problems are fatal
//! before any socket is bound.

use std::process;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::signal;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use drivebridge_server::{create_router, AppState, ServerConfig};

#[derive(Parser)]
#[command(name = "drivebridge")]
#[command(about = "DriveBridge - relay uploads into a Google Drive folder")]
#[command(version)]
struct Cli {
    /// Address to bind.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };
    let port = config.port;

    let state = match AppState::new(config) {
        Ok(state) => Arc::new(state),
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    if let Err(e) = state.connect().await {
        error!("Credential acquisition failed: {}", e);
        process::exit(1);
    }

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind((cli.host.as_str(), port)).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutting down...");
}
