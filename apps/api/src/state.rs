use std::sync::Arc;

use crate::accounts::service::AccountService;
use crate::config::Config;
use crate::matching::pipeline::MatchPipeline;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub accounts: AccountService,
    /// Engine behind it is chosen at startup via `MATCH_STRATEGY`.
    pub pipeline: Arc<MatchPipeline>,
    pub config: Config,
}
