use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use traffic_api::config::Config;
use traffic_api::db::store::{MemoryStore, SeedData, TrafficStore};
use traffic_api::gateway::scheduler;
use traffic_api::routes::ApiDoc;
use traffic_api::AppState;

#[tokio::main]
async fn main() {
    // Load .env file (silently skip if missing, env vars may be set externally)
    if dotenvy::dotenv().is_err() {
        let env_path = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(env_path);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let port = config.port;

    // In-memory document store, optionally seeded from a JSON file.
    let store: Arc<dyn TrafficStore> = match &config.seed_data_path {
        Some(path) => {
            let seed = SeedData::from_file(path).expect("failed to load seed data");
            tracing::info!(
                %path,
                users = seed.users.len(),
                readings = seed.readings.len(),
                incidents = seed.incidents.len(),
                "store seeded"
            );
            Arc::new(MemoryStore::from_seed(seed))
        }
        None => Arc::new(MemoryStore::new()),
    };

    let state = AppState::new(config, store);
    let timers = scheduler::spawn_all(state.hub.clone(), state.store.clone(), &state.config);

    tracing::info!(
        heartbeat = ?state.config.heartbeat_interval,
        timers = timers.len(),
        "traffic-api configured"
    );

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .merge(traffic_api::routes::router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "traffic-api listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    for timer in timers {
        timer.abort();
    }
    tracing::info!("traffic-api stopped");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(?e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
