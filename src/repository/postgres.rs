//! Postgres-backed repository.
//!
//! Expects a `pessoas` table with UNIQUE constraints on `email`, `telefone`
//! and `cpf`. Queries are checked at runtime so the crate builds without a
//! live database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    postgres::{PgPool, PgPoolOptions},
    Postgres, QueryBuilder,
};
use uuid::Uuid;

use super::{PersonRepository, RepoError};
use crate::models::{NewPerson, Person, PersonChanges, UniqueField};

const COLUMNS: &str =
    "id, nome, idade, cpf, endereco, email, telefone, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct PersonRow {
    id: Uuid,
    nome: String,
    idade: i32,
    cpf: String,
    endereco: String,
    email: String,
    telefone: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PersonRow> for Person {
    type Error = RepoError;

    fn try_from(row: PersonRow) -> Result<Self, Self::Error> {
        let idade = u8::try_from(row.idade).map_err(|_| {
            RepoError::Persistence(format!("idade {} out of range for {}", row.idade, row.id))
        })?;

        Ok(Self {
            id: row.id,
            nome: row.nome,
            idade,
            cpf: row.cpf,
            endereco: row.endereco,
            email: row.email,
            telefone: row.telefone,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Clone)]
pub struct PgPersonRepository {
    pool: PgPool,
}

impl PgPersonRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
    }

    async fn find_one(&self, column: &str, value: &str) -> Result<Option<Person>, RepoError> {
        let sql = format!("SELECT {COLUMNS} FROM pessoas WHERE {column} = $1");
        sqlx::query_as::<_, PersonRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?
            .map(Person::try_from)
            .transpose()
    }
}

/// Maps driver errors onto repository errors, recognising unique violations.
fn map_sqlx_error(err: sqlx::Error) -> RepoError {
    match err {
        sqlx::Error::RowNotFound => RepoError::NotFound,
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
            let field = field_for_constraint(db.constraint().unwrap_or_default());
            RepoError::Duplicate {
                field,
                value: String::new(),
            }
        }
        other => RepoError::from_persistence(other),
    }
}

/// Postgres names column constraints `<table>_<column>_key` by default.
fn field_for_constraint(constraint: &str) -> UniqueField {
    if constraint.contains("telefone") {
        UniqueField::Phone
    } else if constraint.contains("cpf") {
        UniqueField::NationalId
    } else {
        UniqueField::Email
    }
}

/// Fills in the offending value, which the driver error does not carry.
fn with_value(err: RepoError, email: &str, telefone: &str, cpf: &str) -> RepoError {
    match err {
        RepoError::Duplicate { field, .. } => {
            let value = match field {
                UniqueField::Email => email,
                UniqueField::Phone => telefone,
                UniqueField::NationalId => cpf,
            };
            RepoError::Duplicate {
                field,
                value: value.to_string(),
            }
        }
        other => other,
    }
}

/// Escapes LIKE wildcards so the fragment matches literally.
fn like_pattern(fragment: &str) -> String {
    let escaped = fragment
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[async_trait]
impl PersonRepository for PgPersonRepository {
    async fn insert(&self, person: NewPerson) -> Result<Person, RepoError> {
        let sql = format!(
            "INSERT INTO pessoas (id, nome, idade, cpf, endereco, email, telefone, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, NOW(), NOW()) \
             RETURNING {COLUMNS}"
        );

        let row = sqlx::query_as::<_, PersonRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(&person.nome)
            .bind(i32::from(person.idade))
            .bind(&person.cpf)
            .bind(&person.endereco)
            .bind(&person.email)
            .bind(&person.telefone)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| {
                with_value(map_sqlx_error(err), &person.email, &person.telefone, &person.cpf)
            })?;

        Person::try_from(row)
    }

    async fn update_by_id(&self, id: Uuid, changes: PersonChanges) -> Result<Person, RepoError> {
        let (email, telefone, cpf) = (
            changes.email.clone().unwrap_or_default(),
            changes.telefone.clone().unwrap_or_default(),
            changes.cpf.clone().unwrap_or_default(),
        );

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE pessoas SET ");
        {
            let mut set = builder.separated(", ");
            if let Some(nome) = changes.nome {
                set.push("nome = ").push_bind_unseparated(nome);
            }
            if let Some(idade) = changes.idade {
                set.push("idade = ").push_bind_unseparated(i32::from(idade));
            }
            if let Some(cpf) = changes.cpf {
                set.push("cpf = ").push_bind_unseparated(cpf);
            }
            if let Some(endereco) = changes.endereco {
                set.push("endereco = ").push_bind_unseparated(endereco);
            }
            if let Some(email) = changes.email {
                set.push("email = ").push_bind_unseparated(email);
            }
            if let Some(telefone) = changes.telefone {
                set.push("telefone = ").push_bind_unseparated(telefone);
            }
            set.push("updated_at = NOW()");
        }
        builder.push(" WHERE id = ").push_bind(id);
        builder.push(" RETURNING ").push(COLUMNS);

        let row = builder
            .build_query_as::<PersonRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| with_value(map_sqlx_error(err), &email, &telefone, &cpf))?
            .ok_or(RepoError::NotFound)?;

        Person::try_from(row)
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<Person, RepoError> {
        let sql = format!("DELETE FROM pessoas WHERE id = $1 RETURNING {COLUMNS}");
        let row = sqlx::query_as::<_, PersonRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?
            .ok_or(RepoError::NotFound)?;

        Person::try_from(row)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Person>, RepoError> {
        let sql = format!("SELECT {COLUMNS} FROM pessoas WHERE id = $1");
        sqlx::query_as::<_, PersonRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?
            .map(Person::try_from)
            .transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Person>, RepoError> {
        self.find_one("email", email).await
    }

    async fn find_by_phone(&self, telefone: &str) -> Result<Option<Person>, RepoError> {
        self.find_one("telefone", telefone).await
    }

    async fn find_by_name_contains(
        &self,
        fragment: &str,
        case_insensitive: bool,
    ) -> Result<Vec<Person>, RepoError> {
        let operator = if case_insensitive { "ILIKE" } else { "LIKE" };
        let sql = format!(
            "SELECT {COLUMNS} FROM pessoas WHERE nome {operator} $1 ESCAPE '\\' \
             ORDER BY nome, created_at"
        );

        let rows = sqlx::query_as::<_, PersonRow>(&sql)
            .bind(like_pattern(fragment))
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        rows.into_iter().map(Person::try_from).collect()
    }
}
