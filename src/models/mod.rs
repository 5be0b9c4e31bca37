//! Domain records and request/response models for the person registry
//!
//! This module defines the Person record plus the DTOs used for
//! serializing/deserializing HTTP request and response bodies.

pub mod person;
pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use person::{NewPerson, Person, PersonChanges, UniqueField};
pub use requests::{CreatePersonRequest, NameSearchQuery, UpdatePersonRequest};
pub use responses::{DeleteResponse, ErrorResponse, HealthResponse};
