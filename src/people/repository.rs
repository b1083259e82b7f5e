//! In-memory directory store standing in for a persistence layer.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use jiff::Timestamp;
use tokio::sync::RwLock;

use crate::error::{AppError, AppResult};
use crate::people::model::{NewPerson, Person, PersonChanges, PersonFilter, Role};

/// Results per page for searches.
pub const PAGE_SIZE: usize = 20;

#[derive(Debug, Default)]
struct Directory {
    people: BTreeMap<u64, Person>,
    roles: BTreeMap<String, Role>,
    next_id: u64,
}

/// Repository over the shared directory.
///
/// Cloning is cheap; all clones see the same data. Every read is counted so
/// callers can tell whether a result came from the store or from the cache.
#[derive(Debug, Clone, Default)]
pub struct PeopleRepository {
    directory: Arc<RwLock<Directory>>,
    reads: Arc<AtomicUsize>,
}

impl PeopleRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// A directory with the `admin` and `member` roles and two people.
    pub async fn with_sample_data() -> AppResult<Self> {
        let repo = Self::new();
        repo.create_role(Role {
            name: "admin".to_string(),
            description: "Full access".to_string(),
        })
        .await?;
        repo.create_role(Role {
            name: "member".to_string(),
            description: "Regular member".to_string(),
        })
        .await?;
        for (name, email, role) in [
            ("Ada Lovelace", "ada@example.com", "admin"),
            ("Alan Turing", "alan@example.com", "member"),
        ] {
            repo.create_person(NewPerson {
                name: name.to_string(),
                email: email.to_string(),
                role: role.to_string(),
            })
            .await?;
        }
        Ok(repo)
    }

    /// Number of read operations served so far.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn record_read(&self) {
        self.reads.fetch_add(1, Ordering::SeqCst);
    }

    pub async fn list_people(&self) -> Vec<Person> {
        self.record_read();
        self.directory.read().await.people.values().cloned().collect()
    }

    pub async fn find_person(&self, id: u64) -> Option<Person> {
        self.record_read();
        self.directory.read().await.people.get(&id).cloned()
    }

    pub async fn find_by_email(&self, email: &str) -> Option<Person> {
        self.record_read();
        self.directory
            .read()
            .await
            .people
            .values()
            .find(|p| p.email.eq_ignore_ascii_case(email))
            .cloned()
    }

    /// Case-insensitive name match, filtered and paged (pages start at 1).
    pub async fn search(&self, term: &str, filter: &PersonFilter, page: u32) -> Vec<Person> {
        self.record_read();
        let term = term.to_lowercase();
        let skip = (page.max(1) as usize - 1) * PAGE_SIZE;
        self.directory
            .read()
            .await
            .people
            .values()
            .filter(|p| p.name.to_lowercase().contains(&term) && filter.matches(p))
            .skip(skip)
            .take(PAGE_SIZE)
            .cloned()
            .collect()
    }

    pub async fn list_roles(&self) -> Vec<Role> {
        self.record_read();
        self.directory.read().await.roles.values().cloned().collect()
    }

    pub async fn create_person(&self, new_person: NewPerson) -> AppResult<Person> {
        let mut directory = self.directory.write().await;
        Self::check_role(&directory, &new_person.role)?;
        Self::check_email_free(&directory, &new_person.email, None)?;

        directory.next_id += 1;
        let now = Timestamp::now();
        let person = Person {
            id: directory.next_id,
            name: new_person.name,
            email: new_person.email,
            role: new_person.role,
            active: true,
            created_at: now,
            updated_at: now,
        };
        directory.people.insert(person.id, person.clone());
        Ok(person)
    }

    pub async fn update_person(&self, id: u64, changes: PersonChanges) -> AppResult<Person> {
        let mut directory = self.directory.write().await;
        if !directory.people.contains_key(&id) {
            return Err(AppError::not_found("person", "id", id));
        }
        if let Some(role) = &changes.role {
            Self::check_role(&directory, role)?;
        }
        if let Some(email) = &changes.email {
            Self::check_email_free(&directory, email, Some(id))?;
        }

        let person = directory
            .people
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("person", "id", id))?;
        if let Some(name) = changes.name {
            person.name = name;
        }
        if let Some(email) = changes.email {
            person.email = email;
        }
        if let Some(role) = changes.role {
            person.role = role;
        }
        if let Some(active) = changes.active {
            person.active = active;
        }
        person.updated_at = Timestamp::now();
        Ok(person.clone())
    }

    /// Returns `false` if no such person existed.
    pub async fn delete_person(&self, id: u64) -> bool {
        self.directory.write().await.people.remove(&id).is_some()
    }

    pub async fn create_role(&self, role: Role) -> AppResult<Role> {
        let mut directory = self.directory.write().await;
        if directory.roles.contains_key(&role.name) {
            return Err(AppError::Conflict {
                entity: "role".to_string(),
                field: "name".to_string(),
                value: role.name,
            });
        }
        directory.roles.insert(role.name.clone(), role.clone());
        Ok(role)
    }

    /// Remove every person and role.
    pub async fn reset(&self) {
        let mut directory = self.directory.write().await;
        directory.people.clear();
        directory.roles.clear();
    }

    fn check_role(directory: &Directory, role: &str) -> AppResult<()> {
        if directory.roles.contains_key(role) {
            Ok(())
        } else {
            Err(AppError::Validation {
                field: "role".to_string(),
                reason: format!("unknown role '{}'", role),
            })
        }
    }

    fn check_email_free(directory: &Directory, email: &str, except: Option<u64>) -> AppResult<()> {
        let taken = directory
            .people
            .values()
            .any(|p| Some(p.id) != except && p.email.eq_ignore_ascii_case(email));
        if taken {
            return Err(AppError::Conflict {
                entity: "person".to_string(),
                field: "email".to_string(),
                value: email.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_person(name: &str, email: &str, role: &str) -> NewPerson {
        NewPerson {
            name: name.to_string(),
            email: email.to_string(),
            role: role.to_string(),
        }
    }

    #[tokio::test]
    async fn test_sample_data() {
        let repo = PeopleRepository::with_sample_data().await.unwrap();
        assert_eq!(repo.list_people().await.len(), 2);
        assert_eq!(repo.list_roles().await.len(), 2);
        assert_eq!(repo.read_count(), 2);
    }

    #[tokio::test]
    async fn test_create_assigns_ids_and_rejects_duplicates() {
        let repo = PeopleRepository::with_sample_data().await.unwrap();
        let grace = repo
            .create_person(new_person("Grace Hopper", "grace@example.com", "member"))
            .await
            .unwrap();
        assert_eq!(grace.id, 3);
        assert!(grace.active);

        let err = repo
            .create_person(new_person("Other", "GRACE@example.com", "member"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict { .. }));

        let err = repo
            .create_person(new_person("Other", "other@example.com", "pilot"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "role"));
    }

    #[tokio::test]
    async fn test_update_missing_person() {
        let repo = PeopleRepository::new();
        let err = repo
            .update_person(42, PersonChanges::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_applies_changes() {
        let repo = PeopleRepository::with_sample_data().await.unwrap();
        let updated = repo
            .update_person(
                2,
                PersonChanges {
                    role: Some("admin".to_string()),
                    active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.role, "admin");
        assert!(!updated.active);
        assert_eq!(updated.name, "Alan Turing");
    }

    #[tokio::test]
    async fn test_search_filters_and_pages() {
        let repo = PeopleRepository::with_sample_data().await.unwrap();
        let admins = PersonFilter {
            roles: vec!["admin".to_string()],
            active: None,
        };
        let found = repo.search("a", &admins, 1).await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].email, "ada@example.com");

        assert!(repo.search("a", &PersonFilter::default(), 2).await.is_empty());
        assert_eq!(repo.search("TURING", &PersonFilter::default(), 0).await.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_and_reset() {
        let repo = PeopleRepository::with_sample_data().await.unwrap();
        assert!(repo.delete_person(1).await);
        assert!(!repo.delete_person(1).await);
        repo.reset().await;
        assert!(repo.list_people().await.is_empty());
        assert!(repo.list_roles().await.is_empty());
    }
}
