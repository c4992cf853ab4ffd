//! Fakes shared by unit and router tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::accounts::service::AccountService;
use crate::accounts::store::AccountStore;
use crate::accounts::tokens::TokenKeys;
use crate::config::{Config, MatchStrategy};
use crate::errors::AppError;
use crate::llm_client::{CompletionRequest, CompletionService, LlmError};
use crate::matching::engine::{AiRequirementEngine, RequirementEngine};
use crate::matching::pipeline::MatchPipeline;
use crate::matching::rules::HardRuleEngine;
use crate::models::account::{Account, NewAccount};
use crate::state::AppState;

pub const TEST_SECRET: &str = "test-secret";

// ────────────────────────────────────────────────────────────
// Completion service
// ────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub system: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Replays canned responses in order and records every request.
/// Once the script runs out, every call fails with `EmptyContent`.
#[derive(Default)]
pub struct ScriptedCompletion {
    responses: Mutex<VecDeque<Result<String, LlmError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedCompletion {
    pub fn new(responses: Vec<Result<String, LlmError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String, LlmError> {
        self.calls.lock().unwrap().push(RecordedCall {
            system: request.system.to_string(),
            prompt: request.prompt.to_string(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        });
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(LlmError::EmptyContent))
    }
}

// ────────────────────────────────────────────────────────────
// Account store
// ────────────────────────────────────────────────────────────

/// Enforces the same uniqueness rules as the `users` table.
#[derive(Default)]
pub struct InMemoryAccountStore {
    rows: Mutex<Vec<Account>>,
}

impl InMemoryAccountStore {
    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    fn find(&self, predicate: impl Fn(&Account) -> bool) -> Option<Account> {
        self.rows.lock().unwrap().iter().find(|a| predicate(a)).cloned()
    }

    fn update(&self, id: Uuid, change: impl FnOnce(&mut Account)) {
        if let Some(row) = self.rows.lock().unwrap().iter_mut().find(|a| a.id == id) {
            change(row);
        }
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn create(&self, account: NewAccount) -> Result<Account, AppError> {
        let mut rows = self.rows.lock().unwrap();
        if rows
            .iter()
            .any(|a| a.username == account.username || a.email == account.email)
        {
            return Err(AppError::AccountConflict("Registration failed".to_string()));
        }
        let row = Account {
            id: Uuid::new_v4(),
            username: account.username,
            email: account.email,
            hashed_password: account.hashed_password,
            first_name: None,
            last_name: None,
            profile_image_url: None,
            profession: None,
            bio: None,
            reset_token: None,
            reset_token_expiration: None,
        };
        rows.push(row.clone());
        Ok(row)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, AppError> {
        Ok(self.find(|a| a.id == id))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, AppError> {
        Ok(self.find(|a| a.username == username))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        Ok(self.find(|a| a.email == email))
    }

    async fn find_by_login(&self, login: &str) -> Result<Option<Account>, AppError> {
        Ok(self
            .find(|a| a.username == login)
            .or_else(|| self.find(|a| a.email == login)))
    }

    async fn find_by_reset_token(&self, token: &str) -> Result<Option<Account>, AppError> {
        Ok(self.find(|a| a.reset_token.as_deref() == Some(token)))
    }

    async fn set_reset_token(
        &self,
        id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        self.update(id, |a| {
            a.reset_token = Some(token.to_string());
            a.reset_token_expiration = Some(expires_at);
        });
        Ok(())
    }

    async fn consume_reset_token(
        &self,
        token: &str,
        hashed_password: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Uuid>, AppError> {
        let mut rows = self.rows.lock().unwrap();
        let Some(row) = rows.iter_mut().find(|a| {
            a.reset_token.as_deref() == Some(token)
                && a.reset_token_expiration.is_some_and(|expires_at| expires_at > now)
        }) else {
            return Ok(None);
        };
        row.hashed_password = hashed_password.to_string();
        row.reset_token = None;
        row.reset_token_expiration = None;
        Ok(Some(row.id))
    }
}

// ────────────────────────────────────────────────────────────
// App state
// ────────────────────────────────────────────────────────────

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://unused".to_string(),
        openai_api_key: "test-key".to_string(),
        openai_base_url: "http://127.0.0.1:9".to_string(),
        model: "test-model".to_string(),
        jwt_secret: TEST_SECRET.to_string(),
        access_token_ttl: Duration::from_secs(24 * 60 * 60),
        reset_token_ttl: Duration::from_secs(3600),
        completion_timeout: Duration::from_secs(5),
        match_strategy: MatchStrategy::Ai,
        bcrypt_cost: 4,
        cors_allowed_origin: "http://localhost:3000".to_string(),
        max_upload_bytes: 1024 * 1024,
        port: 0,
        rust_log: "info".to_string(),
    }
}

/// State wired to in-memory fakes; the engine follows `config.match_strategy`.
pub fn test_state(config: Config, llm: Arc<ScriptedCompletion>) -> AppState {
    let engine: Arc<dyn RequirementEngine> = match config.match_strategy {
        MatchStrategy::Ai => Arc::new(AiRequirementEngine::new(llm.clone())),
        MatchStrategy::Rules => Arc::new(HardRuleEngine),
    };
    let accounts = AccountService::new(
        Arc::new(InMemoryAccountStore::default()),
        TokenKeys::new(&config.jwt_secret, config.access_token_ttl),
        config.bcrypt_cost,
        config.reset_token_ttl,
    );
    AppState {
        accounts,
        pipeline: Arc::new(MatchPipeline::new(engine, llm, config.completion_timeout)),
        config,
    }
}
