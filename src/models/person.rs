//! Person domain types
//!
//! The persisted record, the insert payload and the partial-update payload
//! consumed by the repository layer.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered person, as persisted and as cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: Uuid,
    pub nome: String,
    pub idade: u8,
    pub cpf: String,
    pub endereco: String,
    pub email: String,
    pub telefone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to insert a new person.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPerson {
    pub nome: String,
    pub idade: u8,
    pub cpf: String,
    pub endereco: String,
    pub email: String,
    pub telefone: String,
}

impl NewPerson {
    /// Materializes the record with a fresh id and matching timestamps.
    pub fn into_person(self) -> Person {
        let now = Utc::now();
        Person {
            id: Uuid::new_v4(),
            nome: self.nome,
            idade: self.idade,
            cpf: self.cpf,
            endereco: self.endereco,
            email: self.email,
            telefone: self.telefone,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonChanges {
    pub nome: Option<String>,
    pub idade: Option<u8>,
    pub cpf: Option<String>,
    pub endereco: Option<String>,
    pub email: Option<String>,
    pub telefone: Option<String>,
}

impl PersonChanges {
    /// Applies the changes in place and bumps `updated_at`.
    pub fn apply_to(self, person: &mut Person) {
        if let Some(nome) = self.nome {
            person.nome = nome;
        }
        if let Some(idade) = self.idade {
            person.idade = idade;
        }
        if let Some(cpf) = self.cpf {
            person.cpf = cpf;
        }
        if let Some(endereco) = self.endereco {
            person.endereco = endereco;
        }
        if let Some(email) = self.email {
            person.email = email;
        }
        if let Some(telefone) = self.telefone {
            person.telefone = telefone;
        }
        person.updated_at = Utc::now();
    }
}

/// Columns carrying a uniqueness constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniqueField {
    Email,
    Phone,
    NationalId,
}

impl UniqueField {
    /// Wire/column name of the field.
    pub fn as_str(&self) -> &'static str {
        match self {
            UniqueField::Email => "email",
            UniqueField::Phone => "telefone",
            UniqueField::NationalId => "cpf",
        }
    }
}

impl fmt::Display for UniqueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NewPerson {
        NewPerson {
            nome: "Ana Souza".to_string(),
            idade: 34,
            cpf: "123.456.789-09".to_string(),
            endereco: "Rua das Flores, 10".to_string(),
            email: "ana@x.com".to_string(),
            telefone: "(11) 91234-5678".to_string(),
        }
    }

    #[test]
    fn test_into_person_sets_timestamps() {
        let person = sample().into_person();
        assert_eq!(person.created_at, person.updated_at);
        assert_eq!(person.email, "ana@x.com");
    }

    #[test]
    fn test_changes_apply_only_present_fields() {
        let mut person = sample().into_person();
        let created = person.created_at;

        PersonChanges {
            idade: Some(35),
            ..Default::default()
        }
        .apply_to(&mut person);

        assert_eq!(person.idade, 35);
        assert_eq!(person.email, "ana@x.com");
        assert_eq!(person.created_at, created);
        assert!(person.updated_at >= created);
    }

    #[test]
    fn test_person_json_field_names() {
        let json = serde_json::to_value(sample().into_person()).unwrap();
        for field in ["id", "nome", "idade", "cpf", "endereco", "email", "telefone", "created_at", "updated_at"] {
            assert!(json.get(field).is_some(), "missing {field}");
        }
    }

    #[test]
    fn test_unique_field_names() {
        assert_eq!(UniqueField::Email.to_string(), "email");
        assert_eq!(UniqueField::Phone.to_string(), "telefone");
        assert_eq!(UniqueField::NationalId.to_string(), "cpf");
    }
}
