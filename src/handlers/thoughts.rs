// src/handlers/thoughts.rs

use axum::{extract::State, response::Json, Extension};
use futures_util::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, DateTime};
use mongodb::Collection;
use serde_json::{json, Value};
use validator::Validate;

use crate::errors::{AppError, Result};
use crate::models::thought::{SendThoughtRequest, Thought, ThoughtResponse};
use crate::models::user::Claims;
use crate::state::AppState;

const PAGE_LIMIT: i64 = 50;

async fn are_friends(state: &AppState, a: ObjectId, b: ObjectId) -> Result<bool> {
    let friendships: Collection<crate::models::friendship::Friendship> =
        state.db.collection("friendships");
    let filter = doc! {
        "status": "accepted",
        "$or": [
            { "requester_id": a, "addressee_id": b },
            { "requester_id": b, "addressee_id": a }
        ]
    };
    Ok(friendships.find_one(filter).await?.is_some())
}

pub async fn send_thought(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<SendThoughtRequest>,
) -> Result<Json<Value>> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let from = ObjectId::parse_str(&claims.sub)
        .map_err(|_| AppError::InvalidObjectId(claims.sub.clone()))?;
    let to = ObjectId::parse_str(&payload.to_user_id)
        .map_err(|_| AppError::InvalidObjectId(payload.to_user_id.clone()))?;

    if from == to {
        return Err(AppError::Validation(
            "Cannot send a thought to yourself".to_string(),
        ));
    }
    if !are_friends(&state, from, to).await? {
        return Err(AppError::Validation(
            "You can only send thoughts to friends".to_string(),
        ));
    }

    let collection: Collection<Thought> = state.db.collection("thoughts");
    let thought = Thought {
        id: None,
        from_user_id: from,
        to_user_id: to,
        message: payload.message.clone(),
        created_at: DateTime::now(),
    };
    let insert_result = collection.insert_one(&thought).await?;

    Ok(Json(json!({
        "message": "Thought sent!",
        "id": insert_result.inserted_id.as_object_id().map(|id| id.to_hex()),
    })))
}

pub async fn list_received(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<ThoughtResponse>>> {
    let me = ObjectId::parse_str(&claims.sub)
        .map_err(|_| AppError::InvalidObjectId(claims.sub.clone()))?;

    let collection: Collection<Thought> = state.db.collection("thoughts");
    let thoughts: Vec<Thought> = collection
        .find(doc! { "to_user_id": me })
        .sort(doc! { "created_at": -1 })
        .limit(PAGE_LIMIT)
        .await?
        .try_collect()
        .await?;

    Ok(Json(thoughts.iter().map(ThoughtResponse::from).collect()))
}
