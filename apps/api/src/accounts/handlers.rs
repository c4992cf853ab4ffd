use axum::{
    extract::{FromRequest, State},
    Form, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::accounts::session::CurrentAccount;
use crate::errors::AppError;
use crate::models::account::Account;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────

/// URL-encoded form body; malformed or incomplete forms become `AppError::Validation`.
#[derive(FromRequest)]
#[from_request(via(Form), rejection(AppError))]
pub struct AccountForm<T>(pub T);

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    /// Username or email.
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetRequestForm {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordForm {
    pub token: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct AccountSummary {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub full_name: String,
    pub profile_image_url: Option<String>,
    pub profession: Option<String>,
    pub bio: Option<String>,
}

impl From<Account> for ProfileResponse {
    fn from(account: Account) -> Self {
        Self {
            full_name: account.full_name(),
            id: account.id,
            username: account.username,
            email: account.email,
            first_name: account.first_name,
            last_name: account.last_name,
            profile_image_url: account.profile_image_url,
            profession: account.profession,
            bio: account.bio,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

// ────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────

/// POST /register/
pub async fn handle_register(
    State(state): State<AppState>,
    AccountForm(form): AccountForm<RegisterForm>,
) -> Result<Json<AccountSummary>, AppError> {
    let account = state
        .accounts
        .register(&form.username, &form.email, &form.password)
        .await?;
    Ok(Json(AccountSummary {
        id: account.id,
        username: account.username,
        email: account.email,
    }))
}

/// POST /login/
pub async fn handle_login(
    State(state): State<AppState>,
    AccountForm(form): AccountForm<LoginForm>,
) -> Result<Json<TokenResponse>, AppError> {
    let issued = state.accounts.login(&form.username, &form.password).await?;
    Ok(Json(TokenResponse {
        access_token: issued.access_token,
        token_type: "bearer",
        user_id: issued.account.id,
        username: issued.account.username,
        email: issued.account.email,
    }))
}

/// GET /me/
pub async fn handle_me(CurrentAccount(account): CurrentAccount) -> Json<ProfileResponse> {
    Json(ProfileResponse::from(account))
}

/// POST /request-password-reset/
/// Answers `{ok: true}` whether or not the email is registered.
pub async fn handle_request_password_reset(
    State(state): State<AppState>,
    AccountForm(form): AccountForm<ResetRequestForm>,
) -> Result<Json<OkResponse>, AppError> {
    state.accounts.request_password_reset(&form.email).await?;
    Ok(Json(OkResponse { ok: true }))
}

/// POST /reset-password/
pub async fn handle_reset_password(
    State(state): State<AppState>,
    AccountForm(form): AccountForm<ResetPasswordForm>,
) -> Result<Json<OkResponse>, AppError> {
    state
        .accounts
        .reset_password(&form.token, &form.new_password)
        .await?;
    Ok(Json(OkResponse { ok: true }))
}
