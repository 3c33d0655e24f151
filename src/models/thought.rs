use mongodb::bson::oid::ObjectId;
use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thought {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub from_user_id: ObjectId,
    pub to_user_id: ObjectId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub created_at: DateTime,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SendThoughtRequest {
    pub to_user_id: String,
    #[validate(length(max = 140, message = "Message too long"))]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ThoughtResponse {
    pub id: String,
    pub from_user_id: String,
    pub to_user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub created_at: String,
}

impl From<&Thought> for ThoughtResponse {
    fn from(t: &Thought) -> Self {
        ThoughtResponse {
            id: t.id.map(|id| id.to_hex()).unwrap_or_default(),
            from_user_id: t.from_user_id.to_hex(),
            to_user_id: t.to_user_id.to_hex(),
            message: t.message.clone(),
            created_at: t.created_at.try_to_rfc3339_string().unwrap_or_default(),
        }
    }
}
