use axum::http::Method;
use axum::routing::get;
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::events::{init_event_bus, start_activity_listener, EventBus};
use crate::routes::{health, permissions, role_permissions, roles};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub event_bus: EventBus,
}

impl AppState {
    pub fn new(pool: SqlitePool, event_bus: EventBus) -> Self {
        Self { pool, event_bus }
    }
}

/// Build the router and start the activity listener on the current runtime.
pub async fn create_app(pool: SqlitePool) -> Router {
    let (event_bus, rx) = init_event_bus();
    tokio::spawn(start_activity_listener(rx, pool.clone()));

    let state = AppState::new(pool, event_bus);

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health::health))
        .merge(permissions::routes())
        .merge(roles::routes())
        .merge(role_permissions::routes())
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
