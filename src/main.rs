use clap::Parser;
use std::net::SocketAddr;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use penwell::auth::{session, signer};
use penwell::config::{Cli, Config};
use penwell::db;
use penwell::routes;
use penwell::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Pick up SECRET_KEY / DATABASE_URL from a local .env, if any
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse CLI args and load config
    let cli = Cli::parse();
    let data_dir = Config::data_dir(&cli);
    std::fs::create_dir_all(&data_dir)?;
    tracing::info!("Data directory: {}", data_dir.display());

    let config = Config::load(&cli)?;

    let secret = match config.auth.secret_key.clone() {
        Some(secret) => secret,
        None => {
            tracing::warn!(
                "No SECRET_KEY configured; using a random key, sessions will not survive a restart"
            );
            signer::generate_secret()
        }
    };

    // Initialize database
    let db_path = config
        .db_path()
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("No database path configured"))?;
    tracing::info!("Database: {}", db_path.display());
    let pool = db::create_pool(&db_path)?;
    db::run_migrations(&pool)?;

    let purged = session::purge_expired(&*pool.get()?)?;
    if purged > 0 {
        tracing::info!("Purged {} expired sessions", purged);
    }

    let state = AppState::new(pool, config.clone(), &secret);

    let app = routes::router()
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
