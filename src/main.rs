use std::sync::Arc;

use marquee::api::routes::create_router;
use marquee::api::AppState;
use marquee::config::AppConfig;
use marquee::server;
use marquee::store::PostgresStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from a .env file if one exists
    dotenvy::dotenv().ok();

    // Initialize logging with an explicit filter to suppress sqlx debug logs
    use env_logger::Builder;
    use log::LevelFilter;

    Builder::new()
        .filter_level(LevelFilter::Info)
        .filter_module("sqlx", LevelFilter::Warn)
        .init();

    let config = AppConfig::load()?;

    let database_url = config.database_url();
    let store = PostgresStore::new(&database_url, &config.database).await?;
    store.migrate().await?;
    log::info!("database connection pool established");

    let state = Arc::new(AppState {
        config: config.clone(),
        store,
    });
    let app = create_router().with_state(state);

    server::serve(app, &config).await
}
