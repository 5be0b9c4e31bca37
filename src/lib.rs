//! Pessoas API - Person registry with a read-through lookup cache
//!
//! CRUD over a single Person entity. Email and phone lookups are cached
//! under SHA-256 digest keys and invalidated on every write.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod repository;
pub mod service;
pub mod tasks;

pub use api::{create_router, AppState};
pub use config::Config;
pub use tasks::spawn_cleanup_task;
