//! Orchestration layer composing the cache and the repository.

mod person;

pub use person::{Lookup, PersonService};
