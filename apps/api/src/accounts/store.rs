//! Account persistence.
//!
//! `AccountStore` is the seam between the account service and PostgreSQL; tests
//! substitute an in-memory store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::account::{Account, NewAccount};

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Fails with `AccountConflict` when the username or email is taken.
    async fn create(&self, account: NewAccount) -> Result<Account, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, AppError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, AppError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError>;

    /// Matches `login` against username or email.
    async fn find_by_login(&self, login: &str) -> Result<Option<Account>, AppError>;

    async fn find_by_reset_token(&self, token: &str) -> Result<Option<Account>, AppError>;

    async fn set_reset_token(
        &self,
        id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError>;

    /// Stores `hashed_password` for the account holding `token` if the token is still
    /// live at `now`, clearing the token in the same write. Returns the account id, or
    /// `None` when the token is unknown, expired or already consumed.
    async fn consume_reset_token(
        &self,
        token: &str,
        hashed_password: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Uuid>, AppError>;
}

const ACCOUNT_COLUMNS: &str = "id, username, email, hashed_password, first_name, last_name, \
    profile_image_url, profession, bio, reset_token, reset_token_expiration";

pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// `filter` is the SQL after `WHERE`, binding `value` as `$1`.
    async fn find_one(&self, filter: &str, value: &str) -> Result<Option<Account>, AppError> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM users WHERE {filter}");
        Ok(sqlx::query_as::<_, Account>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?)
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn create(&self, account: NewAccount) -> Result<Account, AppError> {
        let sql = format!(
            "INSERT INTO users (id, username, email, hashed_password) \
             VALUES ($1, $2, $3, $4) RETURNING {ACCOUNT_COLUMNS}"
        );
        let inserted = sqlx::query_as::<_, Account>(&sql)
        .bind(Uuid::new_v4())
        .bind(&account.username)
        .bind(&account.email)
        .bind(&account.hashed_password)
        .fetch_one(&self.pool)
        .await;

        match inserted {
            Ok(row) => Ok(row),
            // Lost a race with a concurrent registration for the same name or email.
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(AppError::AccountConflict("Registration failed".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, AppError> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM users WHERE id = $1");
        Ok(sqlx::query_as::<_, Account>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, AppError> {
        self.find_one("username = $1", username)
            .await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        self.find_one("email = $1", email).await
    }

    async fn find_by_login(&self, login: &str) -> Result<Option<Account>, AppError> {
        self.find_one(
            "username = $1 OR email = $1 ORDER BY username = $1 DESC LIMIT 1",
            login,
        )
        .await
    }

    async fn find_by_reset_token(&self, token: &str) -> Result<Option<Account>, AppError> {
        self.find_one("reset_token = $1", token)
            .await
    }

    async fn set_reset_token(
        &self,
        id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE users SET reset_token = $2, reset_token_expiration = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(token)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn consume_reset_token(
        &self,
        token: &str,
        hashed_password: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Uuid>, AppError> {
        Ok(sqlx::query_scalar::<_, Uuid>(
            r#"
            UPDATE users
            SET hashed_password = $2, reset_token = NULL, reset_token_expiration = NULL
            WHERE reset_token = $1 AND reset_token_expiration > $3
            RETURNING id
            "#,
        )
        .bind(token)
        .bind(hashed_password)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?)
    }
}
