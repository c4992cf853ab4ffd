use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// A row of the `users` table. Not serializable: the password hash and reset
/// token never leave the service; handlers build their own response bodies.
#[derive(Debug, Clone, FromRow)]
pub struct Account {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub hashed_password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
    pub profession: Option<String>,
    pub bio: Option<String>,
    pub reset_token: Option<String>,
    pub reset_token_expiration: Option<DateTime<Utc>>,
}

impl Account {
    /// First and last name joined, or the username when neither is set.
    pub fn full_name(&self) -> String {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        if parts.is_empty() {
            self.username.clone()
        } else {
            parts.join(" ")
        }
    }

    /// True when `token` is this account's outstanding reset token and it has not expired.
    pub fn reset_token_valid(&self, token: &str, now: DateTime<Utc>) -> bool {
        match (&self.reset_token, self.reset_token_expiration) {
            (Some(stored), Some(expires_at)) => stored == token && now < expires_at,
            _ => false,
        }
    }
}

/// Insert payload for a fresh registration.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub hashed_password: String,
}
