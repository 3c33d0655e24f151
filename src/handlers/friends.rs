// src/handlers/friends.rs

use axum::{
    extract::{Path, State},
    response::Json,
    Extension,
};
use futures_util::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, DateTime};
use mongodb::Collection;
use serde_json::{json, Value};

use crate::errors::{AppError, Result};
use crate::models::friendship::{
    FriendRequest, Friendship, FriendshipResponse, FriendshipStatus, RespondFriendRequest,
};
use crate::models::user::{Claims, User};
use crate::state::AppState;

fn parse_id(raw: &str) -> Result<ObjectId> {
    ObjectId::parse_str(raw).map_err(|_| AppError::InvalidObjectId(raw.to_string()))
}

fn friendships(state: &AppState) -> Collection<Friendship> {
    state.db.collection("friendships")
}

pub async fn send_request(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<FriendRequest>,
) -> Result<Json<Value>> {
    let me = parse_id(&claims.sub)?;
    let them = parse_id(&payload.to_user_id)?;

    if me == them {
        return Err(AppError::Validation(
            "Cannot send a friend request to yourself".to_string(),
        ));
    }

    let users: Collection<User> = state.db.collection("users");
    if users.find_one(doc! { "_id": them }).await?.is_none() {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    // One friendship document per pair, regardless of direction.
    let existing = friendships(&state)
        .find_one(doc! {
            "$or": [
                { "requester_id": me, "addressee_id": them },
                { "requester_id": them, "addressee_id": me }
            ]
        })
        .await?;
    if existing.is_some() {
        return Err(AppError::DuplicateKey);
    }

    let friendship = Friendship {
        id: None,
        requester_id: me,
        addressee_id: them,
        status: FriendshipStatus::Pending,
        created_at: DateTime::now(),
        updated_at: DateTime::now(),
    };
    let insert_result = friendships(&state).insert_one(&friendship).await?;

    Ok(Json(json!({
        "message": "Friend request sent",
        "id": insert_result.inserted_id.as_object_id().map(|id| id.to_hex()),
    })))
}

pub async fn respond_to_request(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(payload): Json<RespondFriendRequest>,
) -> Result<Json<Value>> {
    let me = parse_id(&claims.sub)?;
    let request_id = parse_id(&id)?;

    let status_str = match payload.action.as_str() {
        "accept" => "accepted",
        "decline" => "declined",
        _ => {
            return Err(AppError::Validation(
                "Action must be 'accept' or 'decline'".to_string(),
            ))
        }
    };

    let friendship = friendships(&state)
        .find_one(doc! { "_id": request_id })
        .await?
        .ok_or_else(|| AppError::NotFound("Friend request not found".to_string()))?;

    // Only the addressee may answer, and only while it is pending.
    if friendship.addressee_id != me {
        return Err(AppError::Unauthorized);
    }
    if friendship.status != FriendshipStatus::Pending {
        return Err(AppError::Validation(
            "Friend request already answered".to_string(),
        ));
    }

    friendships(&state)
        .update_one(
            doc! { "_id": request_id },
            doc! { "$set": {
                "status": status_str,
                "updated_at": DateTime::now(),
            }},
        )
        .await?;

    Ok(Json(json!({ "message": "Friend request updated", "status": status_str })))
}

pub async fn list_friends(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<FriendshipResponse>>> {
    let me = parse_id(&claims.sub)?;

    let results: Vec<Friendship> = friendships(&state)
        .find(doc! {
            "status": "accepted",
            "$or": [ { "requester_id": me }, { "addressee_id": me } ]
        })
        .await?
        .try_collect()
        .await?;

    Ok(Json(results.iter().map(FriendshipResponse::from).collect()))
}

pub async fn list_incoming_requests(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<FriendshipResponse>>> {
    let me = parse_id(&claims.sub)?;

    let results: Vec<Friendship> = friendships(&state)
        .find(doc! { "addressee_id": me, "status": "pending" })
        .await?
        .try_collect()
        .await?;

    Ok(Json(results.iter().map(FriendshipResponse::from).collect()))
}
