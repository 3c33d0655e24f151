use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which channel a recovery attempt runs over. The two paths never cross:
/// an email code cannot validate a phone contact and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResetMethod {
    Email,
    Phone,
}

impl ResetMethod {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "email" => Some(ResetMethod::Email),
            "phone" => Some(ResetMethod::Phone),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResetMethod::Email => "email",
            ResetMethod::Phone => "phone",
        }
    }
}

/// One in-flight email-path recovery attempt, stored in the token store
/// under `reset:<code>`. Never mutated; deleted on successful commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetArtifact {
    pub user_id: String,
    pub email: String,
    pub phone: String,
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl ResetArtifact {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Phone-path bridge record: the external OTP provider custodies the code,
/// so after a provider-confirmed check we mint this grant under
/// `reset-allowed:<phone>` to authorize the password commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhoneResetGrant {
    pub phone: String,
    pub expires_at: DateTime<Utc>,
}

impl PhoneResetGrant {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Legacy email-link token, stored under `reset-token:<uuid>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetLinkToken {
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

pub fn code_key(code: &str) -> String {
    format!("reset:{}", code)
}

pub fn grant_key(phone: &str) -> String {
    format!("reset-allowed:{}", phone)
}

pub fn link_token_key(token: &str) -> String {
    format!("reset-token:{}", token)
}
