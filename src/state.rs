use std::sync::Arc;

use axum::extract::FromRef;
use quill_authz::TokenService;
use quill_db::Database;
use quill_kernel::Settings;

/// Shared handles passed to every module's router.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub tokens: Arc<TokenService>,
}

impl AppState {
    pub fn new(db: Database, tokens: TokenService) -> Self {
        Self {
            db,
            tokens: Arc::new(tokens),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            Database::new(settings.database.qualified_name()),
            TokenService::new(&settings.auth.jwt_secret, settings.auth.token_ttl_secs),
        )
    }
}

impl FromRef<AppState> for Arc<TokenService> {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}
