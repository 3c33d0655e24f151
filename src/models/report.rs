use mongodb::bson::oid::ObjectId;
use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub reporter_id: ObjectId,
    pub reported_user_id: ObjectId,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub status: String,
    pub created_at: DateTime,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReportRequest {
    pub reported_user_id: String,
    #[validate(length(min = 1, max = 100, message = "Reason is required"))]
    pub reason: String,
    #[validate(length(max = 500, message = "Details too long"))]
    pub details: Option<String>,
}
