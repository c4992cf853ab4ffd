mod accounts;
mod config;
mod db;
mod errors;
mod llm_client;
mod matching;
mod models;
mod routes;
mod state;
#[cfg(test)]
mod test_support;

use anyhow::Result;
use axum::http::HeaderValue;
use std::net::SocketAddr;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::accounts::service::AccountService;
use crate::accounts::store::PgAccountStore;
use crate::accounts::tokens::TokenKeys;
use crate::config::{Config, MatchStrategy};
use crate::db::{create_pool, ensure_schema};
use crate::llm_client::{CompletionService, LlmClient};
use crate::matching::engine::{AiRequirementEngine, RequirementEngine};
use crate::matching::pipeline::MatchPipeline;
use crate::matching::rules::HardRuleEngine;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resume-match API v{}", env!("CARGO_PKG_VERSION"));

    if config.uses_insecure_secret() {
        warn!("SECRET_KEY is not set; signing tokens with the built-in development key");
    }

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    ensure_schema(&db).await?;

    // Initialize completion client
    let llm = LlmClient::new(
        config.openai_api_key.clone(),
        &config.openai_base_url,
        config.model.clone(),
    )?;
    info!("Completion client initialized (model: {})", llm.model());
    let llm: Arc<dyn CompletionService> = Arc::new(llm);

    // Requirement engine (AI by default, swap via MATCH_STRATEGY)
    let engine: Arc<dyn RequirementEngine> = match config.match_strategy {
        MatchStrategy::Ai => Arc::new(AiRequirementEngine::new(llm.clone())),
        MatchStrategy::Rules => Arc::new(HardRuleEngine),
    };
    info!("Requirement engine: {}", engine.name());

    let accounts = AccountService::new(
        Arc::new(PgAccountStore::new(db)),
        TokenKeys::new(&config.jwt_secret, config.access_token_ttl),
        config.bcrypt_cost,
        config.reset_token_ttl,
    );

    // Build app state
    let state = AppState {
        accounts,
        pipeline: Arc::new(MatchPipeline::new(engine, llm, config.completion_timeout)),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.cors_allowed_origin)?);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Single configured origin with credentials. Methods and headers are mirrored,
/// since wildcards are not allowed alongside credentials.
fn cors_layer(origin: &str) -> Result<CorsLayer> {
    Ok(CorsLayer::new()
        .allow_origin(origin.parse::<HeaderValue>()?)
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request()))
}
