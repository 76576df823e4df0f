use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::query::{bind_param, CatMatch, QueryParam};
use super::repository::{CatRepository, RepositoryError, UserRepository, CAT_NOT_FOUND};
use crate::models::cat::CatRow;
use crate::models::user::UserRow;
use crate::models::{Cat, CatPatch, NewCat, User};

const CAT_COLUMNS: &str = "id, name, weight, birthdate, longitude, latitude, owner, filename, created_at";
const USER_COLUMNS: &str = "id, user_name, email, role";

/// Translate driver errors into store-agnostic ones. SQLSTATE 23505 is a
/// unique violation, 23503 a foreign key violation.
pub(crate) fn map_sqlx_error(err: sqlx::Error) -> RepositoryError {
    match &err {
        sqlx::Error::Database(db) => match db.code().as_deref() {
            Some("23505") => match db.constraint() {
                Some("cats_name_key") => RepositoryError::Conflict("Cat name already exists".to_string()),
                Some(constraint) => RepositoryError::Conflict(format!("Duplicate value violates {}", constraint)),
                None => RepositoryError::Conflict("Duplicate value".to_string()),
            },
            Some("23503") => RepositoryError::InvalidReference("Owner does not exist".to_string()),
            _ => RepositoryError::Storage(err.to_string()),
        },
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            RepositoryError::Unavailable(err.to_string())
        }
        _ => RepositoryError::Storage(err.to_string()),
    }
}

#[derive(Clone)]
pub struct PgCatRepository {
    pool: PgPool,
}

impl PgCatRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn assign(assignments: &mut Vec<String>, params: &mut Vec<QueryParam>, column: &str, value: QueryParam) {
    params.push(value);
    assignments.push(format!("{} = ${}", column, params.len()));
}

#[async_trait]
impl CatRepository for PgCatRepository {
    async fn find(&self, filter: CatMatch) -> Result<Vec<Cat>, RepositoryError> {
        let predicate = filter.to_sql();
        let sql = format!(
            "SELECT {} FROM cats WHERE {} ORDER BY created_at, id",
            CAT_COLUMNS, predicate.clause
        );

        let mut q = sqlx::query_as::<_, CatRow>(&sql);
        for p in predicate.params.iter() {
            q = bind_param(q, p);
        }
        let rows = q.fetch_all(&self.pool).await.map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(Cat::from).collect())
    }

    async fn create(&self, cat: NewCat) -> Result<Cat, RepositoryError> {
        let cat = cat.into_cat();
        let sql = format!(
            "INSERT INTO cats ({cols}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {cols}",
            cols = CAT_COLUMNS
        );

        let row = sqlx::query_as::<_, CatRow>(&sql)
            .bind(cat.id)
            .bind(&cat.name)
            .bind(cat.weight)
            .bind(cat.birthdate)
            .bind(cat.location.longitude())
            .bind(cat.location.latitude())
            .bind(cat.owner)
            .bind(&cat.filename)
            .bind(cat.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        tracing::info!("Inserted cat {} ({})", row.id, row.name);
        Ok(Cat::from(row))
    }

    async fn update(&self, filter: CatMatch, patch: CatPatch) -> Result<Cat, RepositoryError> {
        if patch.is_empty() {
            return self
                .find(filter)
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| RepositoryError::NotFound(CAT_NOT_FOUND.to_string()));
        }

        let predicate = filter.to_sql();
        let mut params = predicate.params.clone();
        let mut assignments = Vec::new();

        if let Some(name) = patch.name {
            assign(&mut assignments, &mut params, "name", QueryParam::Text(name));
        }
        if let Some(weight) = patch.weight {
            assign(&mut assignments, &mut params, "weight", QueryParam::Float(weight));
        }
        if let Some(birthdate) = patch.birthdate {
            assign(&mut assignments, &mut params, "birthdate", QueryParam::Date(birthdate));
        }
        if let Some(location) = patch.location {
            assign(&mut assignments, &mut params, "longitude", QueryParam::Float(location.longitude()));
            assign(&mut assignments, &mut params, "latitude", QueryParam::Float(location.latitude()));
        }
        if let Some(owner) = patch.owner {
            assign(&mut assignments, &mut params, "owner", QueryParam::Uuid(owner));
        }
        if let Some(filename) = patch.filename {
            assign(&mut assignments, &mut params, "filename", QueryParam::Text(filename));
        }

        // Match and mutation in one statement, so owner-scoped updates cannot race
        let sql = format!(
            "UPDATE cats SET {} WHERE {} RETURNING {}",
            assignments.join(", "),
            predicate.clause,
            CAT_COLUMNS
        );

        let mut q = sqlx::query_as::<_, CatRow>(&sql);
        for p in params.iter() {
            q = bind_param(q, p);
        }
        let row = q
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?
            .ok_or_else(|| RepositoryError::NotFound(CAT_NOT_FOUND.to_string()))?;

        Ok(Cat::from(row))
    }

    async fn delete(&self, filter: CatMatch) -> Result<Cat, RepositoryError> {
        let predicate = filter.to_sql();
        let sql = format!("DELETE FROM cats WHERE {} RETURNING {}", predicate.clause, CAT_COLUMNS);

        let mut q = sqlx::query_as::<_, CatRow>(&sql);
        for p in predicate.params.iter() {
            q = bind_param(q, p);
        }
        let row = q
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?
            .ok_or_else(|| RepositoryError::NotFound(CAT_NOT_FOUND.to_string()))?;

        tracing::info!("Deleted cat {} ({})", row.id, row.name);
        Ok(Cat::from(row))
    }

    async fn health_check(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: UserRow) -> Result<User, RepositoryError> {
    User::try_from(row).map_err(RepositoryError::Storage)
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn list_all(&self) -> Result<Vec<User>, RepositoryError> {
        let sql = format!("SELECT {} FROM users ORDER BY created_at, id", USER_COLUMNS);
        sqlx::query_as::<_, UserRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?
            .into_iter()
            .map(user_from_row)
            .collect()
    }

    async fn get_by_id(&self, id: Uuid) -> Result<User, RepositoryError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?
            .ok_or_else(|| RepositoryError::NotFound("User not found".to_string()))?;
        user_from_row(row)
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<User>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!("SELECT {} FROM users WHERE id = ANY($1)", USER_COLUMNS);
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?
            .into_iter()
            .map(user_from_row)
            .collect()
    }

    async fn create(&self, user: User) -> Result<User, RepositoryError> {
        let sql = format!(
            "INSERT INTO users ({cols}) VALUES ($1, $2, $3, $4) RETURNING {cols}",
            cols = USER_COLUMNS
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(user.id)
            .bind(&user.user_name)
            .bind(&user.email)
            .bind(user.role.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        user_from_row(row)
    }
}
