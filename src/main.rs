use dotenvy::dotenv;
use fastfood_online::{
    config::{database, seed, server::ServerConfig},
    errors::Result,
    web::{self, AppState},
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, non-fatal: env vars can be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load the server configuration
    let config = ServerConfig::from_env()
        .inspect_err(|e| error!("Invalid server configuration: {}", e))?;

    // 4. Connect and make sure the schema exists
    let db = database::create_connection(&config.database_url)
        .await
        .inspect_err(|e| error!("Failed to connect to {}: {}", config.database_url, e))?;
    database::create_tables(&db)
        .await
        .inspect(|()| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {}", e))?;

    // 5. Seed the catalog and administrators on an empty database
    if let Some(catalog_seed) = seed::load_seed_if_present(&config.seed_path)? {
        seed::seed_database(&db, &catalog_seed)
            .await
            .inspect_err(|e| error!("Failed to seed database: {}", e))?;
    }

    // 6. Serve HTTP
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .inspect_err(|e| error!("Failed to bind {}: {}", config.bind_addr, e))?;
    info!("Listening on {}", config.bind_addr);

    axum::serve(listener, web::router(AppState::new(db))).await?;
    Ok(())
}
