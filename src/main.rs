use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use petitbac::{
    api,
    config::ServerConfig,
    state::AppState,
    store::{JsonlStore, MemoryStore, ScoreStore},
    ws,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "petitbac=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Petit Bac...");

    let config = ServerConfig::from_env();
    tracing::info!(
        "Rooms: {} players max, {}s rounds, {} rounds per game, categories {:?}",
        config.max_players,
        config.game.round_seconds,
        config.game.max_rounds,
        config.game.categories
    );

    let store: Arc<dyn ScoreStore> = match &config.scores_path {
        Some(path) => {
            tracing::info!("Persisting scores to {}", path.display());
            Arc::new(JsonlStore::new(path))
        }
        None => {
            tracing::info!("No PETITBAC_SCORES_PATH set, keeping scores in memory");
            Arc::new(MemoryStore::new())
        }
    };

    let addr = config.addr;
    let static_dir = config.static_dir.clone();
    let state = Arc::new(AppState::new(config, store));

    let app = Router::new()
        .route("/ws", get(ws::ws_handler))
        .merge(api::routes())
        .fallback_service(ServeDir::new(static_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
