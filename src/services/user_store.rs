// src/services/user_store.rs

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, DateTime};
use mongodb::{Collection, Database};

use crate::errors::{AppError, Result};
use crate::models::user::User;

/// Account lookups and the single mutation the recovery flow needs. The
/// trait exists so the recovery core can be tested without a live MongoDB.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn find_by_phone(&self, phone: &str) -> Result<Option<User>>;
    async fn update_password_hash(&self, user_id: &str, password_hash: &str) -> Result<()>;
}

pub struct MongoUserStore {
    db: Database,
}

impl MongoUserStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn users(&self) -> Collection<User> {
        self.db.collection("users")
    }
}

#[async_trait]
impl UserStore for MongoUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = self.users().find_one(doc! { "email": email }).await?;
        Ok(user)
    }

    async fn find_by_phone(&self, phone: &str) -> Result<Option<User>> {
        let user = self.users().find_one(doc! { "phone": phone }).await?;
        Ok(user)
    }

    async fn update_password_hash(&self, user_id: &str, password_hash: &str) -> Result<()> {
        let id = ObjectId::parse_str(user_id)
            .map_err(|_| AppError::InvalidObjectId(user_id.to_string()))?;

        self.users()
            .update_one(
                doc! { "_id": id },
                doc! { "$set": {
                    "password_hash": password_hash,
                    "updated_at": DateTime::now(),
                }},
            )
            .await?;

        Ok(())
    }
}
