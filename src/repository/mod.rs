//! Persistence adapters for Person records.

mod memory;
mod postgres;

pub use memory::MemoryPersonRepository;
pub use postgres::PgPersonRepository;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{NewPerson, Person, PersonChanges, UniqueField};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("resource not found")]
    NotFound,
    #[error("duplicate {field}: {value}")]
    Duplicate { field: UniqueField, value: String },
    #[error("persistence error: {0}")]
    Persistence(String),
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Data access for the `pessoas` table.
#[async_trait]
pub trait PersonRepository: Send + Sync {
    /// Inserts a record; fails with `Duplicate` on an email, telefone or cpf collision.
    async fn insert(&self, person: NewPerson) -> Result<Person, RepoError>;

    /// Applies a partial update; fails with `NotFound` or `Duplicate`.
    async fn update_by_id(&self, id: Uuid, changes: PersonChanges) -> Result<Person, RepoError>;

    /// Deletes and returns the record; fails with `NotFound`.
    async fn delete_by_id(&self, id: Uuid) -> Result<Person, RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Person>, RepoError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Person>, RepoError>;

    async fn find_by_phone(&self, telefone: &str) -> Result<Option<Person>, RepoError>;

    /// Substring match on `nome`, ordered by name.
    async fn find_by_name_contains(
        &self,
        fragment: &str,
        case_insensitive: bool,
    ) -> Result<Vec<Person>, RepoError>;
}
