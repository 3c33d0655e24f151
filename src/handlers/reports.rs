// src/handlers/reports.rs

use axum::{extract::State, response::Json, Extension};
use mongodb::bson::{doc, oid::ObjectId, DateTime};
use mongodb::Collection;
use serde_json::{json, Value};
use validator::Validate;

use crate::errors::{AppError, Result};
use crate::models::report::{CreateReportRequest, Report};
use crate::models::user::{Claims, User};
use crate::state::AppState;

pub async fn create_report(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateReportRequest>,
) -> Result<Json<Value>> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let reporter = ObjectId::parse_str(&claims.sub)
        .map_err(|_| AppError::InvalidObjectId(claims.sub.clone()))?;
    let reported = ObjectId::parse_str(&payload.reported_user_id)
        .map_err(|_| AppError::InvalidObjectId(payload.reported_user_id.clone()))?;

    let users: Collection<User> = state.db.collection("users");
    if users.find_one(doc! { "_id": reported }).await?.is_none() {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    let collection: Collection<Report> = state.db.collection("reports");
    let report = Report {
        id: None,
        reporter_id: reporter,
        reported_user_id: reported,
        reason: payload.reason.clone(),
        details: payload.details.clone(),
        status: "open".to_string(),
        created_at: DateTime::now(),
    };
    let insert_result = collection.insert_one(&report).await?;

    Ok(Json(json!({
        "message": "Report submitted",
        "id": insert_result.inserted_id.as_object_id().map(|id| id.to_hex()),
    })))
}
