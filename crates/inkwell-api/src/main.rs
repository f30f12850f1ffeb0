//! inkwell-api server binary.

use std::net::SocketAddr;

use tracing::info;

use inkwell_api::{router, AppState, RouterOptions, ServerConfig};
use inkwell_core::logging::{self, LogConfig};
use inkwell_db::Database;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // LOG_FORMAT, LOG_FILE, LOG_ANSI and RUST_LOG are honoured
    let log_config = LogConfig::from_env("inkwell_api=debug,inkwell_db=info,tower_http=debug");
    let _log_guard = logging::init(&log_config);
    info!(
        log_format = %log_config.format,
        log_file = log_config.file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    let config = ServerConfig::from_env()?;

    info!("Connecting to database...");
    let db = Database::connect_with_config(&config.database_url, config.pool.clone()).await?;

    info!("Running migrations...");
    db.migrate().await?;

    let options = RouterOptions {
        allowed_origins: config.allowed_origins.clone(),
        max_body_bytes: config.max_body_bytes,
    };
    let app = router(AppState::new(db), options);

    let addr: SocketAddr = config.bind_address().parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
