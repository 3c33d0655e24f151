// src/handlers/notifications.rs

use axum::{extract::State, response::Json, Extension};
use mongodb::bson::{doc, oid::ObjectId, DateTime};
use mongodb::Collection;
use serde_json::{json, Value};
use validator::Validate;

use crate::errors::{AppError, Result};
use crate::models::notification::{PushToken, RegisterTokenRequest};
use crate::models::user::Claims;
use crate::state::AppState;

/// Upsert an Expo push token for the authenticated user. Delivery is handled
/// by the external push service; registration is all we keep.
pub async fn register_push_token(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<RegisterTokenRequest>,
) -> Result<Json<Value>> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let user_id = ObjectId::parse_str(&claims.sub)
        .map_err(|_| AppError::InvalidObjectId(claims.sub.clone()))?;

    let collection: Collection<PushToken> = state.db.collection("push_tokens");

    let filter = doc! {
        "user_id": user_id,
        "token": &payload.token,
    };

    if collection.find_one(filter.clone()).await?.is_none() {
        let token_doc = PushToken {
            id: None,
            user_id,
            token: payload.token.clone(),
            platform: payload.platform.clone(),
            created_at: DateTime::now(),
            updated_at: DateTime::now(),
        };
        collection.insert_one(&token_doc).await?;
    } else {
        let update = doc! {
            "$set": {
                "updated_at": DateTime::now(),
                "platform": &payload.platform,
            }
        };
        collection.update_one(filter, update).await?;
    }

    Ok(Json(json!({
        "message": "Token registered successfully",
    })))
}
