//! In-memory stores backed by a `tokio::sync::RwLock`. Used when no
//! `DATABASE_URL` is configured and by the test suites.
//!
//! Records are kept in insertion order, which is the storage order that
//! `list_all` reports. Each mutation runs inside one write-lock critical
//! section, so a match followed by a mutation is atomic.

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::query::CatMatch;
use super::repository::{CatRepository, RepositoryError, UserRepository, CAT_NOT_FOUND};
use crate::models::{Cat, CatPatch, NewCat, User};

#[derive(Debug, Default)]
pub struct InMemoryCatRepository {
    store: RwLock<Vec<Cat>>,
}

impl InMemoryCatRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn name_taken(cats: &[Cat], name: &str, except: Option<Uuid>) -> bool {
    cats.iter().any(|c| c.name == name && Some(c.id) != except)
}

fn duplicate_name() -> RepositoryError {
    RepositoryError::Conflict("Cat name already exists".to_string())
}

#[async_trait]
impl CatRepository for InMemoryCatRepository {
    async fn find(&self, filter: CatMatch) -> Result<Vec<Cat>, RepositoryError> {
        let store = self.store.read().await;
        Ok(store.iter().filter(|c| filter.matches(c)).cloned().collect())
    }

    async fn create(&self, cat: NewCat) -> Result<Cat, RepositoryError> {
        let mut store = self.store.write().await;
        if name_taken(&store, &cat.name, None) {
            return Err(duplicate_name());
        }
        let cat = cat.into_cat();
        store.push(cat.clone());
        Ok(cat)
    }

    async fn update(&self, filter: CatMatch, patch: CatPatch) -> Result<Cat, RepositoryError> {
        let mut store = self.store.write().await;
        let index = store
            .iter()
            .position(|c| filter.matches(c))
            .ok_or_else(|| RepositoryError::NotFound(CAT_NOT_FOUND.to_string()))?;

        if let Some(name) = &patch.name {
            if name_taken(&store, name, Some(store[index].id)) {
                return Err(duplicate_name());
            }
        }

        patch.apply_to(&mut store[index]);
        Ok(store[index].clone())
    }

    async fn delete(&self, filter: CatMatch) -> Result<Cat, RepositoryError> {
        let mut store = self.store.write().await;
        let index = store
            .iter()
            .position(|c| filter.matches(c))
            .ok_or_else(|| RepositoryError::NotFound(CAT_NOT_FOUND.to_string()))?;
        Ok(store.remove(index))
    }
}

#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    store: RwLock<Vec<User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        Self {
            store: RwLock::new(users.into_iter().collect()),
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn list_all(&self) -> Result<Vec<User>, RepositoryError> {
        Ok(self.store.read().await.clone())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<User, RepositoryError> {
        self.store
            .read()
            .await
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound("User not found".to_string()))
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<User>, RepositoryError> {
        let store = self.store.read().await;
        Ok(store.iter().filter(|u| ids.contains(&u.id)).cloned().collect())
    }

    async fn create(&self, user: User) -> Result<User, RepositoryError> {
        let mut store = self.store.write().await;
        if store.iter().any(|u| u.id == user.id || u.email == user.email) {
            return Err(RepositoryError::Conflict(format!("User {} already exists", user.email)));
        }
        store.push(user.clone());
        Ok(user)
    }
}
