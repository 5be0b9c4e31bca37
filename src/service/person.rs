//! Person orchestration: read-through lookups and write invalidation.
//!
//! Email and phone lookups are served from the cache when possible. Every
//! successful write deletes the lookup keys of the affected record, always
//! after the persistent mutation and never before it.
//!
//! A read-through running concurrently with an update may repopulate a
//! stale entry between the update's commit and its invalidation; that entry
//! lives at most one TTL.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cache::{derive_key, CacheService};
use crate::error::{AppError, CacheError, Result};
use crate::models::{NewPerson, Person, PersonChanges};
use crate::repository::PersonRepository;

// == Lookup ==
/// Cached lookup dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Email,
    Phone,
}

impl Lookup {
    /// Stable label of the query shape, part of the cache key.
    pub fn operation(&self) -> &'static str {
        match self {
            Lookup::Email => "findByEmail",
            Lookup::Phone => "findByPhone",
        }
    }

    /// Cache key for this lookup of `value`.
    pub fn key(&self, value: &str) -> String {
        derive_key(self.operation(), &[Value::from(value)])
    }

    fn describe(&self) -> &'static str {
        match self {
            Lookup::Email => "email",
            Lookup::Phone => "telefone",
        }
    }
}

// == Person Service ==
#[derive(Clone)]
pub struct PersonService {
    repo: Arc<dyn PersonRepository>,
    cache: CacheService,
}

impl PersonService {
    pub fn new(repo: Arc<dyn PersonRepository>, cache: CacheService) -> Self {
        Self { repo, cache }
    }

    pub fn cache(&self) -> &CacheService {
        &self.cache
    }

    // == Writes ==
    pub async fn create(&self, person: NewPerson) -> Result<Person> {
        let created = self.repo.insert(person).await?;

        self.invalidate_lookups(&created).await?;
        info!(id = %created.id, "person created");
        Ok(created)
    }

    /// Updates a record and drops the lookup keys for both its old and new
    /// email and phone.
    pub async fn update(&self, id: Uuid, changes: PersonChanges) -> Result<Person> {
        let before = self.require(id).await?;
        let after = self.repo.update_by_id(id, changes).await?;

        self.invalidate_lookups(&before).await?;
        self.invalidate_lookups(&after).await?;
        info!(id = %id, "person updated");
        Ok(after)
    }

    pub async fn delete(&self, id: Uuid) -> Result<Person> {
        let existing = self.require(id).await?;
        let deleted = self.repo.delete_by_id(id).await?;

        self.invalidate_lookups(&existing).await?;
        info!(id = %id, "person deleted");
        Ok(deleted)
    }

    // == Reads ==
    pub async fn find_by_id(&self, id: Uuid) -> Result<Person> {
        self.require(id).await
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Person> {
        self.read_through(Lookup::Email, email).await
    }

    pub async fn find_by_phone(&self, telefone: &str) -> Result<Person> {
        self.read_through(Lookup::Phone, telefone).await
    }

    /// Case-insensitive substring search; never cached.
    pub async fn search_by_name(&self, fragment: &str) -> Result<Vec<Person>> {
        Ok(self
            .repo
            .find_by_name_contains(fragment.trim(), true)
            .await?)
    }

    // == Protocol ==
    async fn read_through(&self, lookup: Lookup, value: &str) -> Result<Person> {
        let key = lookup.key(value);

        match self.cache.get_json::<Person>(&key).await {
            Ok(Some(cached)) => return Ok(cached),
            Ok(None) => {}
            Err(err @ CacheError::Payload(_)) => {
                // Drop the unreadable entry so the next lookup falls through to the repository.
                warn!(op = lookup.operation(), "discarding undecodable cache entry");
                self.cache.delete(&key).await?;
                return Err(err.into());
            }
            Err(err) => return Err(err.into()),
        }

        let found = match lookup {
            Lookup::Email => self.repo.find_by_email(value).await?,
            Lookup::Phone => self.repo.find_by_phone(value).await?,
        };

        // Absence is never cached.
        let person = found.ok_or_else(|| {
            AppError::NotFound(format!(
                "Person with {} '{}' not found",
                lookup.describe(),
                value
            ))
        })?;

        self.cache.set_json(&key, &person).await?;
        debug!(op = lookup.operation(), id = %person.id, "lookup cached");
        Ok(person)
    }

    async fn invalidate_lookups(&self, person: &Person) -> Result<()> {
        self.cache.delete(&Lookup::Email.key(&person.email)).await?;
        self.cache.delete(&Lookup::Phone.key(&person.telefone)).await?;
        Ok(())
    }

    async fn require(&self, id: Uuid) -> Result<Person> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Person '{id}' not found")))
    }
}
