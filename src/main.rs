//! Admissio server
//!
//! Main application entry point

use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

use admissio::{
    config::Settings,
    utils::logging,
    database::{DatabaseService, connection},
    services::ServiceFactory,
    handlers::{build_router, AppState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new()?;
    settings.validate()?;

    // Initialize logging; the guard keeps the file appender alive
    let _logging_guard = logging::init_logging(&settings.logging)?;

    info!("Starting Admissio server...");

    // Initialize database connection
    info!("Connecting to database...");
    let db_config = connection::DatabaseConfig {
        url: settings.database.url.clone(),
        max_connections: settings.database.max_connections,
        min_connections: settings.database.min_connections,
        acquire_timeout: std::time::Duration::from_secs(30),
        idle_timeout: Some(std::time::Duration::from_secs(600)),
        max_lifetime: Some(std::time::Duration::from_secs(1800)),
    };
    let db_pool = connection::create_pool(&db_config).await?;

    // Run database migrations
    connection::run_migrations(&db_pool).await?;

    // Initialize database service
    let database_service = DatabaseService::new(db_pool);

    // Initialize services
    info!("Initializing services...");
    let services = ServiceFactory::new(settings.clone())?;

    let health = services.health_check().await;
    for issue in health.get_issues() {
        warn!(issue = %issue, "Service degraded at startup");
    }

    // Build the router
    let state = Arc::new(AppState::new(settings.clone(), database_service, services));
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port).parse()?;
    info!(%addr, "Admissio is ready");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    info!("Admissio has been shut down.");

    Ok(())
}
