use axum::http::Method;
use axum::middleware::from_fn_with_state;
use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

mod config;
mod database;
mod errors;
mod handlers;
mod middleware;
mod models;
mod routes;
mod services;
mod state;

use config::AppConfig;
use database::connection::get_db_client;
use middleware::auth::auth_middleware;
use services::email_service::SendGridClient;
use services::otp_service::TwilioVerifyClient;
use services::recovery_service::RecoveryService;
use services::token_store::{FallbackTokenStore, RedisTokenStore, TokenStore};
use services::user_store::MongoUserStore;
use state::AppState;

const CLEANUP_INTERVAL_SECS: u64 = 60;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let config = Arc::new(AppConfig::from_env());

    let db = get_db_client(&config.database_url, &config.database_name).await;
    let app_state = initialize_app_state(db, config.clone());

    spawn_store_cleanup(app_state.token_store.clone());

    let app = build_router(app_state);
    start_server(app, &config).await;
}

fn initialize_app_state(db: mongodb::Database, config: Arc<AppConfig>) -> AppState {
    let redis = RedisTokenStore::new(&config.redis_url)
        .expect("Invalid REDIS_URL");
    let token_store: Arc<dyn TokenStore> = Arc::new(FallbackTokenStore::new(redis));

    let email = Arc::new(SendGridClient::new(
        config.sendgrid_api_key.clone(),
        config.email_from.clone(),
    ));
    let otp = Arc::new(TwilioVerifyClient::new(
        config.twilio_account_sid.clone(),
        config.twilio_auth_token.clone(),
        config.twilio_verify_service_sid.clone(),
    ));
    let users = Arc::new(MongoUserStore::new(db.clone()));

    let recovery = Arc::new(RecoveryService::new(
        users,
        token_store.clone(),
        email,
        otp,
        config.bcrypt_cost,
        config.default_country_code.clone(),
    ));

    AppState::new(db, config, recovery, token_store)
}

/// Periodic sweep of the in-memory fallback store. Redis keys self-expire;
/// the fallback map needs this to avoid accumulating stale entries.
fn spawn_store_cleanup(store: Arc<dyn TokenStore>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(CLEANUP_INTERVAL_SECS));
        loop {
            interval.tick().await;
            let removed = store.cleanup_expired().await;
            if removed > 0 {
                tracing::debug!("swept {} expired fallback entries", removed);
            }
        }
    });
}

fn build_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any)
        .allow_origin(Any);

    let public = Router::new()
        .route("/health", get(health_check))
        .merge(routes::auth::routes())
        .merge(routes::password_reset::routes());

    let protected = Router::new()
        .merge(routes::users::routes())
        .merge(routes::thoughts::routes())
        .merge(routes::friends::routes())
        .merge(routes::reports::routes())
        .merge(routes::notifications::routes())
        .route_layer(from_fn_with_state(app_state.clone(), auth_middleware));

    public
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn start_server(app: Router, config: &AppConfig) {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind server address");

    tracing::info!("listening on {}", addr);

    axum::serve(listener, app)
        .await
        .expect("Server error");
}
