//! Account operations on top of an `AccountStore`.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::accounts::password::{hash_password, verify_password};
use crate::accounts::store::AccountStore;
use crate::accounts::tokens::TokenKeys;
use crate::errors::AppError;
use crate::models::account::{Account, NewAccount};

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub access_token: String,
    pub account: Account,
}

#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn AccountStore>,
    tokens: TokenKeys,
    bcrypt_cost: u32,
    reset_ttl: Duration,
}

impl AccountService {
    pub fn new(
        store: Arc<dyn AccountStore>,
        tokens: TokenKeys,
        bcrypt_cost: u32,
        reset_ttl: Duration,
    ) -> Self {
        Self {
            store,
            tokens,
            bcrypt_cost,
            reset_ttl,
        }
    }

    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Account, AppError> {
        let username = required("username", username)?;
        let email = required("email", email)?;
        if !email.contains('@') {
            return Err(AppError::Validation("email must be an email address".into()));
        }
        if password.is_empty() {
            return Err(AppError::Validation("password must not be empty".into()));
        }

        if self.store.find_by_username(username).await?.is_some() {
            return Err(AppError::AccountConflict("Username already registered".into()));
        }
        if self.store.find_by_email(email).await?.is_some() {
            return Err(AppError::AccountConflict("Email already registered".into()));
        }

        let hashed_password = hash_password(password.to_string(), self.bcrypt_cost).await?;
        let account = self
            .store
            .create(NewAccount {
                username: username.to_string(),
                email: email.to_string(),
                hashed_password,
            })
            .await?;

        info!(account_id = %account.id, "Account registered");
        Ok(account)
    }

    pub async fn login(&self, login: &str, password: &str) -> Result<IssuedToken, AppError> {
        let account = self
            .store
            .find_by_login(login.trim())
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !verify_password(password.to_string(), account.hashed_password.clone()).await {
            debug!(account_id = %account.id, "Password mismatch");
            return Err(AppError::InvalidCredentials);
        }

        let access_token = self.tokens.issue(&account, Utc::now())?;
        info!(account_id = %account.id, "Login succeeded");
        Ok(IssuedToken {
            access_token,
            account,
        })
    }

    /// Resolves a bearer token to its live account.
    pub async fn authenticate(&self, token: &str) -> Result<Account, AppError> {
        let claims = self.tokens.validate(token, Utc::now())?;
        let id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::InvalidToken)?;
        self.store
            .find_by_id(id)
            .await?
            .ok_or(AppError::InvalidToken)
    }

    /// Issues a reset token for the account holding `email`. Returns the token so
    /// it can be delivered; unknown addresses yield `None` and the caller answers
    /// identically either way.
    pub async fn request_password_reset(&self, email: &str) -> Result<Option<String>, AppError> {
        let Some(account) = self.store.find_by_email(email.trim()).await? else {
            info!("Password reset requested for an unknown email");
            return Ok(None);
        };

        let token = new_reset_token();
        let ttl = chrono::Duration::from_std(self.reset_ttl)
            .unwrap_or_else(|_| chrono::Duration::hours(1));
        self.store
            .set_reset_token(account.id, &token, Utc::now() + ttl)
            .await?;

        info!(account_id = %account.id, "Password reset token issued");
        debug!(account_id = %account.id, "Reset token: {token}");
        Ok(Some(token))
    }

    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AppError> {
        if new_password.is_empty() {
            return Err(AppError::Validation("new_password must not be empty".into()));
        }

        // Cheap rejection before paying for a hash; the consuming write re-checks.
        let live = self
            .store
            .find_by_reset_token(token)
            .await?
            .is_some_and(|a| a.reset_token_valid(token, Utc::now()));
        if !live {
            return Err(rejected_reset());
        }

        let hashed = hash_password(new_password.to_string(), self.bcrypt_cost).await?;
        let account_id = self
            .store
            .consume_reset_token(token, &hashed, Utc::now())
            .await?
            .ok_or_else(rejected_reset)?;
        info!(%account_id, "Password reset completed");
        Ok(())
    }
}

fn rejected_reset() -> AppError {
    warn!("Rejected password reset with an unknown, expired or consumed token");
    AppError::InvalidResetToken
}

fn required<'a>(field: &str, value: &'a str) -> Result<&'a str, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::Validation(format!("{field} must not be empty")));
    }
    Ok(value)
}

/// 64 hex characters from two v4 UUIDs: URL-safe and 244 random bits.
fn new_reset_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}
