//! API Handlers
//!
//! HTTP request handlers for each person registry endpoint.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::cache::{CacheService, CacheStore, MemoryStore};
use crate::config::{Config, ErrorExposure};
use crate::error::{AppError, Result};
use crate::metrics::{MetricsCollector, MetricsSnapshot};
use crate::models::{
    CreatePersonRequest, DeleteResponse, HealthResponse, NameSearchQuery, Person,
    UpdatePersonRequest,
};
use crate::repository::{MemoryPersonRepository, PersonRepository};
use crate::service::PersonService;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub people: PersonService,
    pub metrics: MetricsCollector,
    pub error_exposure: ErrorExposure,
}

impl AppState {
    /// Wires the cache, metrics and orchestration layers over the given
    /// repository and cache store.
    pub fn build(
        config: &Config,
        repo: Arc<dyn PersonRepository>,
        store: Arc<dyn CacheStore>,
    ) -> Self {
        let metrics = MetricsCollector::new();
        let cache = CacheService::new(store, metrics.clone(), config.cache_ttl());

        Self {
            people: PersonService::new(repo, cache),
            metrics,
            error_exposure: config.error_exposure,
        }
    }

    /// State backed entirely by in-memory storage.
    pub fn in_memory(config: &Config) -> Self {
        Self::build(
            config,
            Arc::new(MemoryPersonRepository::new()),
            Arc::new(MemoryStore::new(config.cache_max_items)),
        )
    }
}

fn parse_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::Validation(format!("'{raw}' is not a valid id")))
}

/// Handler for POST /pessoas
pub async fn create_person(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreatePersonRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Person>)> {
    let Json(req) = payload.map_err(|e| AppError::Validation(e.body_text()))?;

    if let Some(error_msg) = req.validate() {
        return Err(AppError::Validation(error_msg));
    }

    let person = state.people.create(req.into_new_person()).await?;
    Ok((StatusCode::CREATED, Json(person)))
}

/// Handler for GET /pessoas/:id (uncached)
pub async fn get_person(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Person>> {
    let id = parse_id(&id)?;
    Ok(Json(state.people.find_by_id(id).await?))
}

/// Handler for GET /pessoas/email/:email (read-through)
pub async fn get_by_email(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<Person>> {
    Ok(Json(state.people.find_by_email(&email).await?))
}

/// Handler for GET /pessoas/telefone/:telefone (read-through)
pub async fn get_by_phone(
    State(state): State<AppState>,
    Path(telefone): Path<String>,
) -> Result<Json<Person>> {
    Ok(Json(state.people.find_by_phone(&telefone).await?))
}

/// Handler for GET /pessoas/search/by-name?nome=
pub async fn search_by_name(
    State(state): State<AppState>,
    query: std::result::Result<Query<NameSearchQuery>, QueryRejection>,
) -> Result<Json<Vec<Person>>> {
    let Query(query) = query.map_err(|e| AppError::Validation(e.body_text()))?;

    if let Some(error_msg) = query.validate() {
        return Err(AppError::Validation(error_msg));
    }

    let fragment = query.nome.unwrap_or_default();
    Ok(Json(state.people.search_by_name(&fragment).await?))
}

/// Handler for PUT /pessoas/:id
pub async fn update_person(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<UpdatePersonRequest>, JsonRejection>,
) -> Result<Json<Person>> {
    let id = parse_id(&id)?;
    let Json(req) = payload.map_err(|e| AppError::Validation(e.body_text()))?;

    if let Some(error_msg) = req.validate() {
        return Err(AppError::Validation(error_msg));
    }

    Ok(Json(state.people.update(id, req.into_changes()).await?))
}

/// Handler for DELETE /pessoas/:id
pub async fn delete_person(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let id = parse_id(&id)?;
    let deleted = state.people.delete(id).await?;
    Ok(Json(DeleteResponse::new(deleted.id)))
}

/// Handler for GET /metrics
pub async fn metrics_handler(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot().await)
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
