use std::sync::Arc;

use mongodb::Database;

use crate::config::AppConfig;
use crate::services::recovery_service::RecoveryService;
use crate::services::token_store::TokenStore;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<AppConfig>,
    pub recovery: Arc<RecoveryService>,
    pub token_store: Arc<dyn TokenStore>,
}

impl AppState {
    pub fn new(
        db: Database,
        config: Arc<AppConfig>,
        recovery: Arc<RecoveryService>,
        token_store: Arc<dyn TokenStore>,
    ) -> Self {
        AppState {
            db,
            config,
            recovery,
            token_store,
        }
    }
}
