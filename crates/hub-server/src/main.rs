//! Dataset Hub Server - Main entry point

use anyhow::Result;
use hub_common::{
    kinds::KindRegistry,
    logging::{init_logging, LogConfig},
};
use std::sync::Arc;
use tracing::info;

use hub_server::{
    api,
    config::Config,
    db,
    features::FeatureState,
    notify,
    storage::{config::StorageConfig, Storage},
};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    // Environment variables take precedence over these defaults
    let log_config = LogConfig::builder()
        .log_file_prefix("hub-server")
        .filter_directives("hub_server=debug,tower_http=debug,sqlx=info")
        .build()
        .merge_env()?;

    init_logging(&log_config)?;

    info!("Starting Dataset Hub Server");

    let config = Config::load()?;
    info!(
        "Configuration loaded - server will bind to {}:{}",
        config.server.host, config.server.port
    );

    let db_pool = db::create_pool(&config.database).await?;
    db::migrate(&db_pool).await?;

    let storage = Storage::new(StorageConfig::from_env()?).await?;
    info!("Storage client initialized");

    let notifier = notify::from_config(&config.mail)?;

    let state = FeatureState {
        db: db_pool,
        storage,
        notifier,
        kinds: Arc::new(KindRegistry::default()),
    };

    api::serve(config, state).await
}
