//! API Routes
//!
//! Configures the Axum router with all person registry endpoints.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    create_person, delete_person, get_by_email, get_by_phone, get_person, health_handler,
    metrics_handler, search_by_name, update_person, AppState,
};
use super::middleware::mask_client_errors;
use crate::metrics::track_requests;

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `POST /pessoas` - Create a person
/// - `GET /pessoas/:id` - Fetch by id (uncached)
/// - `GET /pessoas/email/:email` - Fetch by email (read-through cache)
/// - `GET /pessoas/telefone/:telefone` - Fetch by phone (read-through cache)
/// - `GET /pessoas/search/by-name?nome=` - Case-insensitive name search
/// - `PUT /pessoas/:id` - Partial update
/// - `DELETE /pessoas/:id` - Delete
/// - `GET /metrics` - Cache and request metrics
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - Request metrics: recorded per matched route
/// - Error masking: generic 4xx bodies in production
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/pessoas", post(create_person))
        .route("/pessoas/search/by-name", get(search_by_name))
        .route("/pessoas/email/:email", get(get_by_email))
        .route("/pessoas/telefone/:telefone", get(get_by_phone))
        .route(
            "/pessoas/:id",
            get(get_person).put(update_person).delete(delete_person),
        )
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .route_layer(middleware::from_fn_with_state(
            state.metrics.clone(),
            track_requests,
        ))
        .layer(middleware::from_fn_with_state(
            state.error_exposure,
            mask_client_errors,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
