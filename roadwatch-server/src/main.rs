//! roadwatch-server - local development backend for the Roadwatch sighting log
//!
//! Serves the sightings REST API from a SQLite database. Listens on port
//! 3001 by default, which is where development-mode clients look for it.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use roadwatch_common::config::DEFAULT_LOCAL_PORT;
use roadwatch_server::{build_router, db, AppState};
use tracing::{error, info};

/// Command-line arguments for roadwatch-server
#[derive(Parser, Debug)]
#[command(name = "roadwatch-server")]
#[command(about = "Local sightings REST service for Roadwatch")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = DEFAULT_LOCAL_PORT)]
    port: u16,

    /// Address to bind
    #[arg(long, env = "ROADWATCH_BIND", default_value = "0.0.0.0")]
    bind: String,

    /// SQLite database file
    #[arg(long, env = "ROADWATCH_DATABASE")]
    database: Option<PathBuf>,
}

fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("roadwatch")
        .join("roadwatch.db")
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!(
        "Starting Roadwatch local service (roadwatch-server) v{}",
        env!("CARGO_PKG_VERSION")
    );

    let args = Args::parse();

    let db_path = args.database.unwrap_or_else(default_database_path);
    info!("Database path: {}", db_path.display());

    let pool = match db::init_database(&db_path).await {
        Ok(pool) => {
            info!("✓ Database ready");
            pool
        }
        Err(e) => {
            error!("Failed to open database: {:#}", e);
            return Err(e);
        }
    };

    let app = build_router(AppState::new(pool));

    let addr: SocketAddr = format!("{}:{}", args.bind, args.port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", args.bind, args.port))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("roadwatch-server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
