//! bcrypt hashing. Both operations are CPU-bound and run on the blocking pool.

use anyhow::Context;

use crate::errors::AppError;

pub async fn hash_password(password: String, cost: u32) -> Result<String, AppError> {
    let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .context("password hashing task failed")?
        .context("bcrypt hash failed")?;
    Ok(hashed)
}

/// Malformed stored hashes count as a mismatch.
pub async fn verify_password(password: String, hashed: String) -> bool {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hashed).unwrap_or(false))
        .await
        .unwrap_or(false)
}
