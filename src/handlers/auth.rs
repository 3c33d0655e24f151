// src/handlers/auth.rs

use axum::{extract::State, response::Json};
use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use mongodb::bson::{doc, DateTime};
use mongodb::Collection;
use validator::Validate;

use crate::errors::{AppError, Result};
use crate::models::user::{AuthResponse, Claims, CreateUser, LoginUser, User, UserResponse};
use crate::services::normalize::{normalize_email, normalize_phone, normalize_username};
use crate::state::AppState;

const TOKEN_VALID_SECS: i64 = 86400; // 24 hours

fn issue_token(user: &User, state: &AppState) -> Result<String> {
    let claims = Claims {
        sub: user.id.map(|id| id.to_hex()).unwrap_or_default(),
        username: user.username.clone(),
        exp: (Utc::now().timestamp() + TOKEN_VALID_SECS) as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(state.config.jwt_secret.as_ref()),
    )
    .map_err(|e| AppError::Internal(e.to_string()))
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<CreateUser>,
) -> Result<Json<AuthResponse>> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let collection: Collection<User> = state.db.collection("users");

    let username = normalize_username(&payload.username);
    let email = normalize_email(&payload.email);
    let phone = normalize_phone(&payload.phone, &state.config.default_country_code);

    let filter = doc! {
        "$or": [
            { "username": &username },
            { "email": &email },
            { "phone": &phone }
        ]
    };
    if collection.find_one(filter).await?.is_some() {
        return Err(AppError::DuplicateKey);
    }

    let password_hash = hash(&payload.password, state.config.bcrypt_cost)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let mut user = User {
        id: None,
        username,
        email,
        phone,
        display_name: payload.display_name.clone(),
        password_hash,
        created_at: DateTime::now(),
        updated_at: DateTime::now(),
    };

    let insert_result = collection.insert_one(&user).await?;
    user.id = insert_result.inserted_id.as_object_id();

    let token = issue_token(&user, &state)?;

    Ok(Json(AuthResponse {
        user: UserResponse::from(&user),
        token,
    }))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginUser>,
) -> Result<Json<AuthResponse>> {
    let collection: Collection<User> = state.db.collection("users");

    // The identifier can be a username or an email; both are stored
    // lower-cased so the comparison is case-insensitive by construction.
    let identifier = normalize_username(&payload.identifier);
    let filter = doc! {
        "$or": [
            { "username": &identifier },
            { "email": &identifier }
        ]
    };
    let user = collection.find_one(filter).await?.ok_or(AppError::AuthError)?;

    let valid = verify(&payload.password, &user.password_hash)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    if !valid {
        return Err(AppError::AuthError);
    }

    let token = issue_token(&user, &state)?;

    Ok(Json(AuthResponse {
        user: UserResponse::from(&user),
        token,
    }))
}
