//! User repository: the system of record for accounts.

use crate::auth::models::Role;
use crate::auth::user::{NewUser, User, UserId};
use crate::errors::{ContactbookError, Result};
use crate::storage::DbPool;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::str::FromStr;
use tracing::instrument;

const USER_COLUMNS: &str =
    "id, email, username, password_hash, is_verified, avatar_url, role, created_at, updated_at";

#[derive(Debug, Clone, FromRow)]
struct UserRow {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub is_verified: bool,
    pub avatar_url: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Look up a user by email (exact match)
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Look up a user by ID
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>>;

    /// Insert a new user. A duplicate email fails with a unique violation.
    async fn create(&self, user: NewUser) -> Result<User>;

    /// Replace the stored password hash
    async fn update_password(&self, id: UserId, password_hash: &str) -> Result<User>;

    /// Change the user's role
    async fn update_role(&self, id: UserId, role: Role) -> Result<User>;

    /// Set the avatar URL
    async fn update_avatar(&self, id: UserId, avatar_url: &str) -> Result<User>;

    /// Flag the email address as verified
    async fn mark_verified(&self, id: UserId) -> Result<User>;

    /// List users ordered by ID
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>>;

    /// Count total users
    async fn count(&self) -> Result<i64>;
}

#[derive(Debug, Clone)]
pub struct SqlxUserRepository {
    pool: DbPool,
}

impl SqlxUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn row_to_user(row: UserRow) -> Result<User> {
        let role = Role::from_str(&row.role).map_err(|_| {
            ContactbookError::internal(format!("Unknown role '{}' stored for user {}", row.role, row.id))
        })?;

        Ok(User {
            id: row.id,
            email: row.email,
            username: row.username,
            password_hash: row.password_hash,
            is_verified: row.is_verified,
            avatar_url: row.avatar_url,
            role,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }

    async fn fetch_after_write(&self, id: UserId, operation: &str) -> Result<User> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| ContactbookError::not_found("user", format!("{} ({})", id, operation)))
    }

    /// Check that an UPDATE touched the row, then return the fresh record
    async fn finish_update(
        &self,
        id: UserId,
        result: std::result::Result<sqlx::sqlite::SqliteQueryResult, sqlx::Error>,
        operation: &str,
    ) -> Result<User> {
        let result = result.map_err(|err| ContactbookError::Database {
            source: err,
            context: format!("Failed to {}", operation),
        })?;

        if result.rows_affected() == 0 {
            return Err(ContactbookError::not_found("user", id.to_string()));
        }

        self.fetch_after_write(id, operation).await
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    #[instrument(skip(self), name = "db_find_user_by_email")]
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| ContactbookError::Database {
            source: err,
            context: "Failed to fetch user by email".to_string(),
        })?;

        row.map(Self::row_to_user).transpose()
    }

    #[instrument(skip(self), name = "db_find_user_by_id")]
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>> {
        let row =
            sqlx::query_as::<_, UserRow>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|err| ContactbookError::Database {
                    source: err,
                    context: "Failed to fetch user".to_string(),
                })?;

        row.map(Self::row_to_user).transpose()
    }

    #[instrument(skip(self, user), fields(user_email = %user.email), name = "db_create_user")]
    async fn create(&self, user: NewUser) -> Result<User> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO users (email, username, password_hash, is_verified, role, created_at, updated_at)
            VALUES ($1, $2, $3, FALSE, $4, $5, $6)
            "#,
        )
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(Role::User.as_str())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|err| ContactbookError::Database {
            source: err,
            context: "Failed to create user".to_string(),
        })?;

        self.find_by_id(result.last_insert_rowid())
            .await?
            .ok_or_else(|| ContactbookError::internal("User not found after creation"))
    }

    #[instrument(skip(self, password_hash), name = "db_update_user_password")]
    async fn update_password(&self, id: UserId, password_hash: &str) -> Result<User> {
        let result = sqlx::query("UPDATE users SET password_hash = $1, updated_at = $2 WHERE id = $3")
            .bind(password_hash)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await;
        self.finish_update(id, result, "update user password").await
    }

    #[instrument(skip(self), fields(role = %role), name = "db_update_user_role")]
    async fn update_role(&self, id: UserId, role: Role) -> Result<User> {
        let result = sqlx::query("UPDATE users SET role = $1, updated_at = $2 WHERE id = $3")
            .bind(role.as_str())
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await;
        self.finish_update(id, result, "update user role").await
    }

    #[instrument(skip(self), name = "db_update_user_avatar")]
    async fn update_avatar(&self, id: UserId, avatar_url: &str) -> Result<User> {
        let result = sqlx::query("UPDATE users SET avatar_url = $1, updated_at = $2 WHERE id = $3")
            .bind(avatar_url)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await;
        self.finish_update(id, result, "update user avatar").await
    }

    #[instrument(skip(self), name = "db_mark_user_verified")]
    async fn mark_verified(&self, id: UserId) -> Result<User> {
        let result = sqlx::query("UPDATE users SET is_verified = TRUE, updated_at = $1 WHERE id = $2")
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await;
        self.finish_update(id, result, "mark user verified").await
    }

    #[instrument(skip(self), name = "db_list_users")]
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users ORDER BY id LIMIT $1 OFFSET $2",
            USER_COLUMNS
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|err| ContactbookError::Database {
            source: err,
            context: "Failed to list users".to_string(),
        })?;

        rows.into_iter().map(Self::row_to_user).collect()
    }

    #[instrument(skip(self), name = "db_count_users")]
    async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(|err| ContactbookError::Database {
                source: err,
                context: "Failed to count users".to_string(),
            })?;

        Ok(count)
    }
}
