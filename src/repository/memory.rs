//! In-process repository used when no database is configured, and by tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{PersonRepository, RepoError};
use crate::models::{NewPerson, Person, PersonChanges, UniqueField};

#[derive(Debug, Default)]
pub struct MemoryPersonRepository {
    rows: RwLock<HashMap<Uuid, Person>>,
}

impl MemoryPersonRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Finds the first unique column of `candidate` already used by another row.
fn conflict<'a>(
    rows: &HashMap<Uuid, Person>,
    candidate: &'a Person,
) -> Option<(UniqueField, &'a str)> {
    let id = candidate.id;
    let others = move || rows.values().filter(move |p| p.id != id);

    if others().any(|p| p.email == candidate.email) {
        return Some((UniqueField::Email, &candidate.email));
    }
    if others().any(|p| p.telefone == candidate.telefone) {
        return Some((UniqueField::Phone, &candidate.telefone));
    }
    if others().any(|p| p.cpf == candidate.cpf) {
        return Some((UniqueField::NationalId, &candidate.cpf));
    }
    None
}

fn duplicate((field, value): (UniqueField, &str)) -> RepoError {
    RepoError::Duplicate {
        field,
        value: value.to_string(),
    }
}

#[async_trait]
impl PersonRepository for MemoryPersonRepository {
    async fn insert(&self, person: NewPerson) -> Result<Person, RepoError> {
        let mut rows = self.rows.write().await;
        let person = person.into_person();

        if let Some(hit) = conflict(&rows, &person) {
            return Err(duplicate(hit));
        }

        rows.insert(person.id, person.clone());
        Ok(person)
    }

    async fn update_by_id(&self, id: Uuid, changes: PersonChanges) -> Result<Person, RepoError> {
        let mut rows = self.rows.write().await;

        let mut updated = rows.get(&id).cloned().ok_or(RepoError::NotFound)?;
        changes.apply_to(&mut updated);

        if let Some(hit) = conflict(&rows, &updated) {
            return Err(duplicate(hit));
        }

        rows.insert(id, updated.clone());
        Ok(updated)
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<Person, RepoError> {
        self.rows
            .write()
            .await
            .remove(&id)
            .ok_or(RepoError::NotFound)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Person>, RepoError> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Person>, RepoError> {
        Ok(self
            .rows
            .read()
            .await
            .values()
            .find(|p| p.email == email)
            .cloned())
    }

    async fn find_by_phone(&self, telefone: &str) -> Result<Option<Person>, RepoError> {
        Ok(self
            .rows
            .read()
            .await
            .values()
            .find(|p| p.telefone == telefone)
            .cloned())
    }

    async fn find_by_name_contains(
        &self,
        fragment: &str,
        case_insensitive: bool,
    ) -> Result<Vec<Person>, RepoError> {
        let needle = if case_insensitive {
            fragment.to_lowercase()
        } else {
            fragment.to_string()
        };

        let mut matches: Vec<Person> = self
            .rows
            .read()
            .await
            .values()
            .filter(|p| {
                if case_insensitive {
                    p.nome.to_lowercase().contains(&needle)
                } else {
                    p.nome.contains(&needle)
                }
            })
            .cloned()
            .collect();

        matches.sort_by(|a, b| a.nome.cmp(&b.nome).then(a.created_at.cmp(&b.created_at)));
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(n: u8) -> NewPerson {
        NewPerson {
            nome: format!("Pessoa {n}"),
            idade: 20 + n,
            cpf: format!("000.000.000-{n:02}"),
            endereco: "Rua B, 2".to_string(),
            email: format!("p{n}@x.com"),
            telefone: format!("(11) 90000-00{n:02}"),
        }
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let repo = MemoryPersonRepository::new();
        let created = repo.insert(person(1)).await.unwrap();

        assert_eq!(repo.find_by_id(created.id).await.unwrap(), Some(created.clone()));
        assert_eq!(repo.find_by_email("p1@x.com").await.unwrap(), Some(created.clone()));
        assert_eq!(
            repo.find_by_phone("(11) 90000-0001").await.unwrap(),
            Some(created)
        );
        assert_eq!(repo.find_by_email("nobody@x.com").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_insert_duplicate_email() {
        let repo = MemoryPersonRepository::new();
        repo.insert(person(1)).await.unwrap();

        let mut clash = person(2);
        clash.email = "p1@x.com".to_string();

        match repo.insert(clash).await {
            Err(RepoError::Duplicate { field, value }) => {
                assert_eq!(field, UniqueField::Email);
                assert_eq!(value, "p1@x.com");
            }
            other => panic!("expected duplicate, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_insert_duplicate_phone_and_cpf() {
        let repo = MemoryPersonRepository::new();
        repo.insert(person(1)).await.unwrap();

        let mut phone_clash = person(2);
        phone_clash.telefone = "(11) 90000-0001".to_string();
        assert!(matches!(
            repo.insert(phone_clash).await,
            Err(RepoError::Duplicate { field: UniqueField::Phone, .. })
        ));

        let mut cpf_clash = person(3);
        cpf_clash.cpf = "000.000.000-01".to_string();
        assert!(matches!(
            repo.insert(cpf_clash).await,
            Err(RepoError::Duplicate { field: UniqueField::NationalId, .. })
        ));
    }

    #[tokio::test]
    async fn test_update_keeps_own_unique_values() {
        let repo = MemoryPersonRepository::new();
        let created = repo.insert(person(1)).await.unwrap();

        let updated = repo
            .update_by_id(
                created.id,
                PersonChanges {
                    idade: Some(60),
                    email: Some("p1@x.com".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.idade, 60);
        assert_eq!(updated.created_at, created.created_at);
    }

    #[tokio::test]
    async fn test_update_conflict_leaves_row_untouched() {
        let repo = MemoryPersonRepository::new();
        let first = repo.insert(person(1)).await.unwrap();
        repo.insert(person(2)).await.unwrap();

        let result = repo
            .update_by_id(
                first.id,
                PersonChanges {
                    email: Some("p2@x.com".to_string()),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result, Err(RepoError::Duplicate { .. })));
        assert_eq!(repo.find_by_id(first.id).await.unwrap().unwrap().email, "p1@x.com");
    }

    #[tokio::test]
    async fn test_update_and_delete_missing() {
        let repo = MemoryPersonRepository::new();
        let id = Uuid::new_v4();

        assert!(matches!(
            repo.update_by_id(id, PersonChanges::default()).await,
            Err(RepoError::NotFound)
        ));
        assert!(matches!(repo.delete_by_id(id).await, Err(RepoError::NotFound)));
    }

    #[tokio::test]
    async fn test_delete_returns_row() {
        let repo = MemoryPersonRepository::new();
        let created = repo.insert(person(1)).await.unwrap();

        assert_eq!(repo.delete_by_id(created.id).await.unwrap(), created);
        assert_eq!(repo.find_by_id(created.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_name_search() {
        let repo = MemoryPersonRepository::new();
        let mut ana = person(1);
        ana.nome = "Ana Souza".to_string();
        let mut mariana = person(2);
        mariana.nome = "Mariana Lima".to_string();
        let mut bruno = person(3);
        bruno.nome = "Bruno Costa".to_string();
        for p in [ana, mariana, bruno] {
            repo.insert(p).await.unwrap();
        }

        let found = repo.find_by_name_contains("ANA", true).await.unwrap();
        let names: Vec<_> = found.iter().map(|p| p.nome.as_str()).collect();
        assert_eq!(names, vec!["Ana Souza", "Mariana Lima"]);

        assert!(repo.find_by_name_contains("ANA", false).await.unwrap().is_empty());
    }
}
