use axum::{middleware, routing::get, Json, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;

use crate::config::ServerConfig;
use crate::handlers::{health, not_found, search, AppState};
use crate::middleware::request_id;
use crate::openapi::ApiDoc;
use granary::{GranaryError, RecordStore, SearchEngine};

/// Path the search operation is documented under in [`ApiDoc`].
const DOCUMENTED_SEARCH_PATH: &str = "/api/activities";

/// Router with every route and layer, for a given state and mount point.
pub fn build_router(state: Arc<AppState>, search_path: &str) -> Router {
    let search_path = search_path.trim_end_matches('/');
    let doc = api_doc(search_path);

    Router::new()
        .route(search_path, get(search))
        .route(&format!("{}/", search_path), get(search))
        .route("/health", get(health))
        .route(
            "/api-docs/openapi.json",
            get(move || {
                let doc = doc.clone();
                async move { Json(doc) }
            }),
        )
        .fallback(not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id))
        .layer(CorsLayer::permissive())
}

/// OpenAPI document with the search path rewritten to where it is mounted.
fn api_doc(search_path: &str) -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    if search_path != DOCUMENTED_SEARCH_PATH {
        if let Some(item) = doc.paths.paths.remove(DOCUMENTED_SEARCH_PATH) {
            doc.paths.paths.insert(search_path.to_string(), item);
        }
    }
    doc
}

/// Open the configured corpus. With `lenient_startup` a missing or broken
/// corpus yields an empty, unavailable store instead of an error.
pub fn open_store(config: &ServerConfig) -> Result<RecordStore, GranaryError> {
    let opened = match &config.corpus_path {
        Some(path) => RecordStore::open(path),
        None => Err(GranaryError::Config("GRANARY_CORPUS is not set".into())),
    };
    match opened {
        Ok(store) => Ok(store),
        Err(e) if config.lenient_startup => {
            tracing::warn!(error = %e, "starting without a corpus; searches return 503");
            Ok(RecordStore::unavailable())
        }
        Err(e) => Err(e),
    }
}

pub async fn serve(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    config.validate()?;
    let store = Arc::new(open_store(&config)?);
    tracing::info!(
        records = store.snapshot().map(|s| s.corpus.len()).unwrap_or(0),
        default_rows = config.default_rows,
        max_rows = config.max_rows,
        query_timeout_ms = config.query_timeout.as_millis() as u64,
        "Corpus store ready"
    );

    let state = Arc::new(AppState {
        engine: SearchEngine::new(store, config.planner_limits()),
        query_timeout: config.query_timeout,
    });
    let app = build_router(state, config.search_path());

    tracing::info!(
        "Starting Granary server on {} (search at {})",
        config.bind_addr,
        config.search_path()
    );

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
