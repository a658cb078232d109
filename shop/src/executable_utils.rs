use clap::Parser;
use std::{error::Error, sync::Arc};
use metrics_exporter_prometheus::PrometheusBuilder;
use sea_orm::DatabaseConnection;
use common::config::{BackendConfig, Config};
use crate::{
    api::{create_router, AppState},
    seed::seed_sample_data,
    service::ProdShopService,
    storage::create_schema,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to config file
    #[arg(short, long, default_value = "target/debug/config/total_config.yaml")]
    pub config: String,
}

pub fn initialize_executable() -> Result<Config, Box<dyn Error + Send + Sync>> {
    // .env may provide DATABASE_URL; absence is fine
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    let config = Config::load(&args.config)?;
    initialize_tracing(&config.backend.log_level);

    tracing::info!(
        config = %args.config,
        project = %config.common.project_name,
        "Loaded configuration"
    );
    Ok(config)
}

pub fn initialize_tracing(log_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));
    // A subscriber may already be installed (tests); keep the existing one.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

pub async fn run_backend(
    config: BackendConfig,
    db: DatabaseConnection,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let metrics = PrometheusBuilder::new().install_recorder()?;

    create_schema(&db).await?;
    let service = Arc::new(ProdShopService::new(
        db,
        config.batch_fetch_size,
        config.default_page_limit,
    )?);
    if config.seed_sample_data {
        seed_sample_data(&service).await?;
    }

    let state = AppState::new(service.clone(), service.clone(), service.clone(), service)
        .with_metrics(metrics);

    let app = create_router(state, &config.cors_origin)?;

    tracing::info!("Starting backend service at {}", config.server_address);
    let listener = tokio::net::TcpListener::bind(&config.server_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
