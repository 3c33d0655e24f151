use mongodb::bson::oid::ObjectId;
use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FriendshipStatus {
    Pending,
    Accepted,
    Declined,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Friendship {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub requester_id: ObjectId,
    pub addressee_id: ObjectId,
    pub status: FriendshipStatus,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Deserialize)]
pub struct FriendRequest {
    pub to_user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct RespondFriendRequest {
    // "accept" or "decline"
    pub action: String,
}

#[derive(Debug, Serialize)]
pub struct FriendshipResponse {
    pub id: String,
    pub requester_id: String,
    pub addressee_id: String,
    pub status: FriendshipStatus,
}

impl From<&Friendship> for FriendshipResponse {
    fn from(f: &Friendship) -> Self {
        FriendshipResponse {
            id: f.id.map(|id| id.to_hex()).unwrap_or_default(),
            requester_id: f.requester_id.to_hex(),
            addressee_id: f.addressee_id.to_hex(),
            status: f.status,
        }
    }
}
