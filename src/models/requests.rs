//! Request DTOs for the person registry API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use super::person::{NewPerson, PersonChanges};

// == Field Rules ==
/// Maximum age accepted for a person
pub const MAX_AGE: i64 = 150;
/// Maximum length for the name field, in characters
pub const MAX_NAME_LENGTH: usize = 100;
/// Maximum length for the address field, in characters
pub const MAX_ADDRESS_LENGTH: usize = 200;

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));
static PHONE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\(\d{2}\) \d{4,5}-\d{4}$").expect("valid phone regex"));
static CPF_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{3}\.\d{3}\.\d{3}-\d{2}$").expect("valid cpf regex"));

fn check_text(field: &str, value: &str, max: usize) -> Option<String> {
    if value.trim().is_empty() {
        return Some(format!("{field} cannot be empty"));
    }
    if value.chars().count() > max {
        return Some(format!("{field} exceeds maximum length of {max} characters"));
    }
    None
}

fn check_age(idade: i64) -> Option<String> {
    if !(0..=MAX_AGE).contains(&idade) {
        return Some(format!("idade must be between 0 and {MAX_AGE}"));
    }
    None
}

fn check_email(email: &str) -> Option<String> {
    (!EMAIL_PATTERN.is_match(email)).then(|| "email must be a valid email address".to_string())
}

fn check_phone(telefone: &str) -> Option<String> {
    (!PHONE_PATTERN.is_match(telefone))
        .then(|| "telefone must match (00) 00000-0000 or (00) 0000-0000".to_string())
}

fn check_cpf(cpf: &str) -> Option<String> {
    (!CPF_PATTERN.is_match(cpf)).then(|| "cpf must match 000.000.000-00".to_string())
}

/// Request body for POST /pessoas
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePersonRequest {
    pub nome: String,
    pub idade: i64,
    pub cpf: String,
    pub endereco: String,
    pub email: String,
    pub telefone: String,
}

impl CreatePersonRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        check_text("nome", &self.nome, MAX_NAME_LENGTH)
            .or_else(|| check_age(self.idade))
            .or_else(|| check_cpf(&self.cpf))
            .or_else(|| check_text("endereco", &self.endereco, MAX_ADDRESS_LENGTH))
            .or_else(|| check_email(&self.email))
            .or_else(|| check_phone(&self.telefone))
    }

    /// Converts a validated request into the repository payload.
    pub fn into_new_person(self) -> NewPerson {
        NewPerson {
            nome: self.nome,
            idade: self.idade.clamp(0, MAX_AGE) as u8,
            cpf: self.cpf,
            endereco: self.endereco,
            email: self.email,
            telefone: self.telefone,
        }
    }
}

/// Request body for PUT /pessoas/:id (every field optional)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePersonRequest {
    #[serde(default)]
    pub nome: Option<String>,
    #[serde(default)]
    pub idade: Option<i64>,
    #[serde(default)]
    pub cpf: Option<String>,
    #[serde(default)]
    pub endereco: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub telefone: Option<String>,
}

impl UpdatePersonRequest {
    /// Validates only the fields that are present.
    pub fn validate(&self) -> Option<String> {
        self.nome
            .as_deref()
            .and_then(|v| check_text("nome", v, MAX_NAME_LENGTH))
            .or_else(|| self.idade.and_then(check_age))
            .or_else(|| self.cpf.as_deref().and_then(check_cpf))
            .or_else(|| {
                self.endereco
                    .as_deref()
                    .and_then(|v| check_text("endereco", v, MAX_ADDRESS_LENGTH))
            })
            .or_else(|| self.email.as_deref().and_then(check_email))
            .or_else(|| self.telefone.as_deref().and_then(check_phone))
    }

    pub fn into_changes(self) -> PersonChanges {
        PersonChanges {
            nome: self.nome,
            idade: self.idade.map(|v| v.clamp(0, MAX_AGE) as u8),
            cpf: self.cpf,
            endereco: self.endereco,
            email: self.email,
            telefone: self.telefone,
        }
    }
}

/// Query string for GET /pessoas/search/by-name
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NameSearchQuery {
    #[serde(default)]
    pub nome: Option<String>,
}

impl NameSearchQuery {
    pub fn validate(&self) -> Option<String> {
        match self.nome.as_deref().map(str::trim) {
            None | Some("") => Some("nome query parameter is required".to_string()),
            Some(_) => None,
        }
    }
}
