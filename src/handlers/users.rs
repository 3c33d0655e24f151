// src/handlers/users.rs

use axum::{
    extract::{Path, State},
    response::Json,
    Extension,
};
use mongodb::bson::{doc, oid::ObjectId, DateTime};
use mongodb::Collection;
use validator::Validate;

use crate::errors::{AppError, Result};
use crate::models::user::{Claims, UpdateProfile, User, UserResponse};
use crate::state::AppState;

fn claims_user_id(claims: &Claims) -> Result<ObjectId> {
    ObjectId::parse_str(&claims.sub).map_err(|_| AppError::InvalidObjectId(claims.sub.clone()))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<UserResponse>> {
    let collection: Collection<User> = state.db.collection("users");
    let id = claims_user_id(&claims)?;

    let user = collection
        .find_one(doc! { "_id": id })
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(UserResponse::from(&user)))
}

pub async fn update_me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateProfile>,
) -> Result<Json<UserResponse>> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let collection: Collection<User> = state.db.collection("users");
    let id = claims_user_id(&claims)?;

    collection
        .update_one(
            doc! { "_id": id },
            doc! { "$set": {
                "display_name": payload.display_name.as_deref(),
                "updated_at": DateTime::now(),
            }},
        )
        .await?;

    let user = collection
        .find_one(doc! { "_id": id })
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(UserResponse::from(&user)))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>> {
    let collection: Collection<User> = state.db.collection("users");
    let id = ObjectId::parse_str(&id).map_err(|_| AppError::InvalidObjectId(id))?;

    let user = collection
        .find_one(doc! { "_id": id })
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(UserResponse::from(&user)))
}
