//! Users repository for database operations

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::user::{Role, User, UserQuery, UserSummary},
};

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get user by ID (excluding soft-deleted users)
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Get user by email
    pub async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE LOWER(email) = LOWER($1) AND deleted_at IS NULL",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Check if email is already registered
    pub async fn email_exists(&self, email: &str) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1))",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Insert a new (unverified) user
    pub async fn create(
        &self,
        email: &str,
        password_hash: &str,
        name: &str,
        role: Role,
        verification_token: &str,
    ) -> AppResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, name, role, verification_token)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .bind(name)
        .bind(role)
        .bind(verification_token)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Mark the user with this email as verified and clear the stored token
    pub async fn mark_verified(&self, email: &str) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET is_verified = TRUE, verification_token = NULL
            WHERE LOWER(email) = LOWER($1) AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// List users matching the admin filters
    pub async fn search(&self, query: &UserQuery) -> AppResult<Vec<UserSummary>> {
        let mut sql = String::from(
            r#"
            SELECT id, email, name, role, is_verified, is_active, created_at
            FROM users
            WHERE deleted_at IS NULL
            "#,
        );

        let mut idx = 0;
        if query.name.is_some() {
            idx += 1;
            sql.push_str(&format!(" AND name ILIKE ${}", idx));
        }
        if query.email.is_some() {
            idx += 1;
            sql.push_str(&format!(" AND email ILIKE ${}", idx));
        }
        if query.role.is_some() {
            idx += 1;
            sql.push_str(&format!(" AND role = ${}", idx));
        }
        if query.is_active.is_some() {
            idx += 1;
            sql.push_str(&format!(" AND is_active = ${}", idx));
        }
        if query.is_verified.is_some() {
            idx += 1;
            sql.push_str(&format!(" AND is_verified = ${}", idx));
        }
        sql.push_str(" ORDER BY created_at DESC");

        let mut q = sqlx::query_as::<_, UserSummary>(&sql);
        if let Some(ref name) = query.name {
            q = q.bind(format!("%{}%", name));
        }
        if let Some(ref email) = query.email {
            q = q.bind(format!("%{}%", email));
        }
        if let Some(role) = query.role {
            q = q.bind(role);
        }
        if let Some(is_active) = query.is_active {
            q = q.bind(is_active);
        }
        if let Some(is_verified) = query.is_verified {
            q = q.bind(is_verified);
        }

        Ok(q.fetch_all(&self.pool).await?)
    }

    /// Flip the is_active flag for a user
    pub async fn toggle_status(&self, id: Uuid) -> AppResult<UserSummary> {
        sqlx::query_as::<_, UserSummary>(
            r#"
            UPDATE users
            SET is_active = NOT is_active
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING id, email, name, role, is_verified, is_active, created_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }
}
