use mongodb::bson::oid::ObjectId;
use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Expo push token registered by the mobile client. Delivery is handled by
/// an external push service; we only keep the registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushToken {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub token: String,
    pub platform: String,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterTokenRequest {
    #[validate(length(min = 1, message = "Token is required"))]
    pub token: String,
    #[validate(length(min = 1, message = "Platform is required"))]
    pub platform: String,
}
