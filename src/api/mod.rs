//! API Module
//!
//! HTTP handlers, middleware and routing for the person registry REST API.
//!
//! # Endpoints
//! - `POST /pessoas`, `GET|PUT|DELETE /pessoas/:id`
//! - `GET /pessoas/email/:email`, `GET /pessoas/telefone/:telefone` (cached)
//! - `GET /pessoas/search/by-name?nome=`
//! - `GET /metrics`, `GET /health`

pub mod handlers;
pub mod middleware;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
