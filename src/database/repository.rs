//! Store traits for cats and users.
//!
//! Both traits have a Postgres implementation ([`super::postgres`]) and an
//! in-memory one ([`super::memory`]); handlers only see the traits.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use super::query::CatMatch;
use crate::models::{BoundingBox, Cat, CatPatch, NewCat, User};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RepositoryError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store error: {0}")]
    Storage(String),
}

pub(crate) const CAT_NOT_FOUND: &str = "Cat not found";

#[async_trait]
pub trait CatRepository: Send + Sync {
    /// Every record matching `filter`, in storage order
    async fn find(&self, filter: CatMatch) -> Result<Vec<Cat>, RepositoryError>;

    /// Insert a new record. Duplicate names fail with [`RepositoryError::Conflict`].
    async fn create(&self, cat: NewCat) -> Result<Cat, RepositoryError>;

    /// Apply `patch` to the single record matching `filter` and return it.
    async fn update(&self, filter: CatMatch, patch: CatPatch) -> Result<Cat, RepositoryError>;

    /// Remove the single record matching `filter` and return it.
    async fn delete(&self, filter: CatMatch) -> Result<Cat, RepositoryError>;

    async fn health_check(&self) -> Result<(), RepositoryError> {
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Cat>, RepositoryError> {
        self.find(CatMatch::All).await
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Cat, RepositoryError> {
        self.find(CatMatch::Id(id))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RepositoryError::NotFound(CAT_NOT_FOUND.to_string()))
    }

    async fn list_by_owner(&self, owner: Uuid) -> Result<Vec<Cat>, RepositoryError> {
        self.find(CatMatch::Owner(owner)).await
    }

    async fn list_by_bounding_box(&self, area: BoundingBox) -> Result<Vec<Cat>, RepositoryError> {
        self.find(CatMatch::Within(area)).await
    }

    async fn update_by_id(&self, id: Uuid, patch: CatPatch) -> Result<Cat, RepositoryError> {
        self.update(CatMatch::Id(id), patch).await
    }

    /// Update only if `id` exists *and* belongs to `owner`.
    async fn update_owned(&self, id: Uuid, owner: Uuid, patch: CatPatch) -> Result<Cat, RepositoryError> {
        self.update(CatMatch::Owned { id, owner }, patch).await
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<Cat, RepositoryError> {
        self.delete(CatMatch::Id(id)).await
    }

    /// Delete only if `id` exists *and* belongs to `owner`.
    async fn delete_owned(&self, id: Uuid, owner: Uuid) -> Result<Cat, RepositoryError> {
        self.delete(CatMatch::Owned { id, owner }).await
    }
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn list_all(&self) -> Result<Vec<User>, RepositoryError>;

    async fn get_by_id(&self, id: Uuid) -> Result<User, RepositoryError>;

    /// Users whose id is in `ids`, in no particular order. Unknown ids are skipped.
    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<User>, RepositoryError>;

    async fn create(&self, user: User) -> Result<User, RepositoryError>;

    async fn exists(&self, id: Uuid) -> Result<bool, RepositoryError> {
        match self.get_by_id(id).await {
            Ok(_) => Ok(true),
            Err(RepositoryError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
