use std::error::Error;

use sea_orm::{ConnectOptions, Database};
use shop::executable_utils::{initialize_executable, run_backend};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let config = initialize_executable()?;

    let mut options = ConnectOptions::new(config.common.database_url.clone());
    options.sqlx_logging(false);
    let db = Database::connect(options).await?;
    tracing::info!("Connected to database");

    run_backend(config.backend, db).await
}
