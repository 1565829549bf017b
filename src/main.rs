use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use tracing::info;

mod api;
mod config;
mod dashboard;
mod model;

use api::features::FEATURE_COUNT;
use api::PredictionService;
use config::{Cli, Command, DashboardConfig, ServeConfig};
use dashboard::{AppState, PredictionClient};
use model::ModelStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve(cfg) => serve(cfg).await,
        Command::Dashboard(cfg) => run_dashboard(cfg).await,
    }
}

async fn serve(cfg: ServeConfig) -> Result<()> {
    let addr = cfg.validate()?;

    // Both models must load before anything binds.
    let models = ModelStore::load(
        Path::new(&cfg.pre_match_model),
        Path::new(&cfg.live_model),
        FEATURE_COUNT,
    )
    .context("Failed to load prediction models")?;

    let app = api::router(PredictionService::new(models));
    info!("Prediction API listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn run_dashboard(cfg: DashboardConfig) -> Result<()> {
    let addr = cfg.validate()?;

    let client = PredictionClient::new(&cfg.api_base_url, cfg.request_timeout())?;
    info!("Dashboard using prediction API at {}", client.base_url());

    let app = dashboard::router(AppState { client });
    info!("Dashboard listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
