// src/services/recovery_service.rs
//
// Orchestrates the three client-visible recovery operations (request a
// code, verify it, commit a new password), enforcing expiry and single use.
// There is no session object between steps: every step re-validates the
// caller-supplied code, so the client must retain it across round trips.

use chrono::{Duration, Utc};
use rand::Rng;
use std::sync::Arc;
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::reset::{
    code_key, grant_key, link_token_key, PhoneResetGrant, ResetArtifact, ResetLinkToken,
    ResetMethod,
};
use crate::models::user::User;
use crate::services::email_service::EmailClient;
use crate::services::normalize::{normalize_email, normalize_phone};
use crate::services::otp_service::{OtpProvider, OTP_STATUS_APPROVED};
use crate::services::token_store::TokenStore;
use crate::services::user_store::UserStore;

/// Application-level lifetime of a code or grant.
const RESET_VALID_MINUTES: i64 = 10;
/// Store-layer TTL for `reset:<code>` records. Deliberately wider than the
/// 10-minute `expires_at` check, which is the binding one.
const CODE_STORE_TTL_SECS: u64 = 3600;
/// Store-layer TTL for `reset-allowed:<phone>` grants.
const GRANT_STORE_TTL_SECS: u64 = 600;
/// Legacy email-link tokens live for an hour.
const LINK_TOKEN_TTL_SECS: u64 = 3600;

pub struct RequestResetOutcome {
    pub method: ResetMethod,
    /// Phone path only: the client needs these to drive the OTP check screen.
    pub user_id: Option<String>,
    pub phone: Option<String>,
}

pub struct RecoveryService {
    users: Arc<dyn UserStore>,
    store: Arc<dyn TokenStore>,
    email: Arc<dyn EmailClient>,
    otp: Arc<dyn OtpProvider>,
    bcrypt_cost: u32,
    country_code: String,
}

impl RecoveryService {
    pub fn new(
        users: Arc<dyn UserStore>,
        store: Arc<dyn TokenStore>,
        email: Arc<dyn EmailClient>,
        otp: Arc<dyn OtpProvider>,
        bcrypt_cost: u32,
        country_code: String,
    ) -> Self {
        Self {
            users,
            store,
            email,
            otp,
            bcrypt_cost,
            country_code,
        }
    }

    fn generate_code() -> String {
        let mut rng = rand::thread_rng();
        format!("{:06}", rng.gen_range(0..1_000_000))
    }

    fn normalize_contact(&self, method: ResetMethod, contact: &str) -> String {
        match method {
            ResetMethod::Email => normalize_email(contact),
            ResetMethod::Phone => normalize_phone(contact, &self.country_code),
        }
    }

    async fn find_user(&self, method: ResetMethod, contact: &str) -> Result<User> {
        let found = match method {
            ResetMethod::Email => self.users.find_by_email(contact).await?,
            ResetMethod::Phone => self.users.find_by_phone(contact).await?,
        };
        found.ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Issue a channel-appropriate artifact for an existing account.
    pub async fn request_reset(
        &self,
        method: ResetMethod,
        contact: &str,
    ) -> Result<RequestResetOutcome> {
        let contact = self.normalize_contact(method, contact);
        let user = self.find_user(method, &contact).await?;
        let user_id = user.id.map(|id| id.to_hex()).unwrap_or_default();

        match method {
            ResetMethod::Email => {
                let code = Self::generate_code();
                let now = Utc::now();

                let artifact = ResetArtifact {
                    user_id,
                    email: user.email.clone(),
                    phone: user.phone.clone(),
                    code: code.clone(),
                    created_at: now,
                    expires_at: now + Duration::minutes(RESET_VALID_MINUTES),
                };
                let payload = serde_json::to_string(&artifact)
                    .map_err(|e| AppError::Internal(e.to_string()))?;
                self.store
                    .set(&code_key(&code), &payload, CODE_STORE_TTL_SECS)
                    .await
                    .map_err(|e| AppError::Internal(e.to_string()))?;

                // Legacy email-link token; the email carries both the code
                // and a link so older client screens keep working.
                let token = Uuid::new_v4().to_string();
                let link = ResetLinkToken {
                    email: user.email.clone(),
                    expires_at: now + Duration::seconds(LINK_TOKEN_TTL_SECS as i64),
                };
                let link_payload = serde_json::to_string(&link)
                    .map_err(|e| AppError::Internal(e.to_string()))?;
                self.store
                    .set(&link_token_key(&token), &link_payload, LINK_TOKEN_TTL_SECS)
                    .await
                    .map_err(|e| AppError::Internal(e.to_string()))?;

                let body = format!(
                    "Your Heartbeam password reset code is: {}\n\n\
                     It expires in {} minutes. You can also reset from your \
                     browser: https://heartbeam.app/reset?token={}",
                    code, RESET_VALID_MINUTES, token
                );
                self.email
                    .send_email(&user.email, "Reset your Heartbeam password", &body)
                    .await
                    .map_err(|e| AppError::Delivery(e.to_string()))?;

                Ok(RequestResetOutcome {
                    method,
                    user_id: None,
                    phone: None,
                })
            }
            ResetMethod::Phone => {
                // The provider issues and custodies the code; nothing is
                // stored locally until its check comes back approved.
                self.otp
                    .start_verification(&contact)
                    .await
                    .map_err(|e| AppError::Delivery(e.to_string()))?;

                Ok(RequestResetOutcome {
                    method,
                    user_id: Some(user_id),
                    phone: Some(contact),
                })
            }
        }
    }

    async fn load_artifact(&self, code: &str) -> Result<ResetArtifact> {
        let payload = self
            .store
            .get(&code_key(code))
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?
            .ok_or(AppError::InvalidOrExpired)?;
        serde_json::from_str(&payload).map_err(|e| AppError::Internal(e.to_string()))
    }

    /// Email path: the stored record's contact under the given method must
    /// equal the caller-supplied contact AND the record must be unexpired.
    async fn validate_email_code(&self, contact: &str, code: &str) -> Result<ResetArtifact> {
        let artifact = self.load_artifact(code).await?;
        if artifact.email != contact || artifact.is_expired(Utc::now()) {
            return Err(AppError::InvalidOrExpired);
        }
        Ok(artifact)
    }

    async fn load_grant(&self, phone: &str) -> Result<PhoneResetGrant> {
        let payload = self
            .store
            .get(&grant_key(phone))
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?
            .ok_or(AppError::InvalidOrExpired)?;
        let grant: PhoneResetGrant =
            serde_json::from_str(&payload).map_err(|e| AppError::Internal(e.to_string()))?;
        if grant.is_expired(Utc::now()) {
            return Err(AppError::InvalidOrExpired);
        }
        Ok(grant)
    }

    /// Returns the owning user id on success. Verification does not consume
    /// the artifact; only a successful password commit does.
    pub async fn verify_code(
        &self,
        method: ResetMethod,
        contact: &str,
        code: &str,
    ) -> Result<String> {
        let contact = self.normalize_contact(method, contact);

        match method {
            ResetMethod::Email => {
                let artifact = self.validate_email_code(&contact, code).await?;
                Ok(artifact.user_id)
            }
            ResetMethod::Phone => {
                let user = self.find_user(method, &contact).await?;
                let status = self
                    .otp
                    .check_verification(&contact, code)
                    .await
                    .map_err(|e| AppError::Delivery(e.to_string()))?;
                if status != OTP_STATUS_APPROVED {
                    return Err(AppError::InvalidOrExpired);
                }

                // Bridge record authorizing the follow-up password commit;
                // the provider has already consumed the code itself.
                let grant = PhoneResetGrant {
                    phone: contact.clone(),
                    expires_at: Utc::now() + Duration::minutes(RESET_VALID_MINUTES),
                };
                let payload = serde_json::to_string(&grant)
                    .map_err(|e| AppError::Internal(e.to_string()))?;
                self.store
                    .set(&grant_key(&contact), &payload, GRANT_STORE_TTL_SECS)
                    .await
                    .map_err(|e| AppError::Internal(e.to_string()))?;

                Ok(user.id.map(|id| id.to_hex()).unwrap_or_default())
            }
        }
    }

    /// Re-validates exactly as `verify_code` would (the client's "verified"
    /// state may be stale), then hashes and persists the new password and
    /// deletes the consumed artifact or grant so it cannot be replayed.
    ///
    /// On the phone path the supplied `code` is deliberately unused: the
    /// provider consumed it during the `verify_code` check and a second
    /// provider call could never succeed, so re-validation means checking
    /// the unexpired `reset-allowed:<phone>` grant that check minted.
    pub async fn commit_password(
        &self,
        method: ResetMethod,
        contact: &str,
        code: &str,
        new_password: &str,
    ) -> Result<()> {
        if new_password.len() < 6 {
            return Err(AppError::Validation(
                "Password must be at least 6 characters".to_string(),
            ));
        }

        let contact = self.normalize_contact(method, contact);

        let (user_id, consumed_key) = match method {
            ResetMethod::Email => {
                let artifact = self.validate_email_code(&contact, code).await?;
                (artifact.user_id, code_key(code))
            }
            ResetMethod::Phone => {
                self.load_grant(&contact).await?;
                let user = self.find_user(method, &contact).await?;
                (
                    user.id.map(|id| id.to_hex()).unwrap_or_default(),
                    grant_key(&contact),
                )
            }
        };

        let hash = bcrypt::hash(new_password, self.bcrypt_cost)
            .map_err(|e| AppError::Internal(e.to_string()))?;
        self.users.update_password_hash(&user_id, &hash).await?;

        self.store
            .delete(&consumed_key)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;

        Ok(())
    }

    /// Legacy email-link flow: check a `reset-token:<uuid>` record and hand
    /// back the email it was issued for.
    pub async fn verify_link_token(&self, token: &str) -> Result<String> {
        let payload = self
            .store
            .get(&link_token_key(token))
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?
            .ok_or(AppError::InvalidOrExpired)?;
        let link: ResetLinkToken =
            serde_json::from_str(&payload).map_err(|e| AppError::Internal(e.to_string()))?;
        if Utc::now() > link.expires_at {
            self.store
                .delete(&link_token_key(token))
                .await
                .map_err(|e| AppError::Internal(e.to_string()))?;
            return Err(AppError::InvalidOrExpired);
        }
        Ok(link.email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::token_store::MemoryTokenStore;
    use async_trait::async_trait;
    use mongodb::bson::oid::ObjectId;
    use mongodb::bson::DateTime;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct MemoryUserStore {
        users: Vec<User>,
        password_updates: Mutex<HashMap<String, String>>,
    }

    impl MemoryUserStore {
        fn with_user(user: User) -> Self {
            Self {
                users: vec![user],
                password_updates: Mutex::new(HashMap::new()),
            }
        }
    }

    #[async_trait]
    impl UserStore for MemoryUserStore {
        async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
            Ok(self.users.iter().find(|u| u.email == email).cloned())
        }

        async fn find_by_phone(&self, phone: &str) -> Result<Option<User>> {
            Ok(self.users.iter().find(|u| u.phone == phone).cloned())
        }

        async fn update_password_hash(&self, user_id: &str, hash: &str) -> Result<()> {
            self.password_updates
                .lock()
                .unwrap()
                .insert(user_id.to_string(), hash.to_string());
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockEmailClient {
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl EmailClient for MockEmailClient {
        async fn send_email(&self, to: &str, _subject: &str, body: &str) -> anyhow::Result<()> {
            self.sent
                .lock()
                .unwrap()
                .push((to.to_string(), body.to_string()));
            Ok(())
        }
    }

    struct MockOtpProvider {
        status: String,
        started: Mutex<Vec<String>>,
    }

    impl MockOtpProvider {
        fn with_status(status: &str) -> Self {
            Self {
                status: status.to_string(),
                started: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl OtpProvider for MockOtpProvider {
        async fn start_verification(&self, phone: &str) -> anyhow::Result<()> {
            self.started.lock().unwrap().push(phone.to_string());
            Ok(())
        }

        async fn check_verification(&self, _phone: &str, _code: &str) -> anyhow::Result<String> {
            Ok(self.status.clone())
        }
    }

    fn test_user() -> User {
        User {
            id: Some(ObjectId::new()),
            username: "jdoe".to_string(),
            email: "a@example.com".to_string(),
            phone: "+15551234567".to_string(),
            display_name: None,
            password_hash: "old-hash".to_string(),
            created_at: DateTime::now(),
            updated_at: DateTime::now(),
        }
    }

    struct Harness {
        service: RecoveryService,
        users: Arc<MemoryUserStore>,
        store: Arc<MemoryTokenStore>,
        email: Arc<MockEmailClient>,
    }

    fn harness_with_otp_status(status: &str) -> Harness {
        let users = Arc::new(MemoryUserStore::with_user(test_user()));
        let store = Arc::new(MemoryTokenStore::new());
        let email = Arc::new(MockEmailClient::default());
        let otp = Arc::new(MockOtpProvider::with_status(status));
        let service = RecoveryService::new(
            users.clone(),
            store.clone(),
            email.clone(),
            otp,
            // min cost keeps the tests fast
            4,
            "+1".to_string(),
        );
        Harness {
            service,
            users,
            store,
            email,
        }
    }

    fn harness() -> Harness {
        harness_with_otp_status(OTP_STATUS_APPROVED)
    }

    fn sent_code(email: &MockEmailClient) -> String {
        let sent = email.sent.lock().unwrap();
        let (_, body) = sent.last().expect("no email sent");
        let after = body
            .split("code is: ")
            .nth(1)
            .expect("no code marker in email body");
        after.chars().take(6).collect()
    }

    async fn put_artifact(store: &MemoryTokenStore, artifact: &ResetArtifact) {
        let payload = serde_json::to_string(artifact).unwrap();
        store
            .set(&code_key(&artifact.code), &payload, 3600)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn email_roundtrip_and_single_use() {
        let h = harness();
        let outcome = h
            .service
            .request_reset(ResetMethod::Email, "A@Example.com")
            .await
            .unwrap();
        assert_eq!(outcome.method, ResetMethod::Email);
        assert!(outcome.user_id.is_none());

        let code = sent_code(&h.email);
        let user_id = h
            .service
            .verify_code(ResetMethod::Email, "a@example.com", &code)
            .await
            .unwrap();
        assert!(!user_id.is_empty());

        h.service
            .commit_password(ResetMethod::Email, "a@example.com", &code, "abcdef")
            .await
            .unwrap();
        assert!(h
            .users
            .password_updates
            .lock()
            .unwrap()
            .contains_key(&user_id));

        // Artifact deleted on success: replay must fail.
        let replay = h
            .service
            .commit_password(ResetMethod::Email, "a@example.com", &code, "ghijkl")
            .await;
        assert!(matches!(replay, Err(AppError::InvalidOrExpired)));
    }

    #[tokio::test]
    async fn verify_requires_exact_contact_match() {
        let h = harness();
        h.service
            .request_reset(ResetMethod::Email, "a@example.com")
            .await
            .unwrap();
        let code = sent_code(&h.email);

        let wrong = h
            .service
            .verify_code(ResetMethod::Email, "b@example.com", &code)
            .await;
        assert!(matches!(wrong, Err(AppError::InvalidOrExpired)));
    }

    #[tokio::test]
    async fn expiry_boundary_is_enforced_at_read_time() {
        let h = harness();
        let user_id = h.users.users[0].id.unwrap().to_hex();
        let now = Utc::now();

        let mut artifact = ResetArtifact {
            user_id: user_id.clone(),
            email: "a@example.com".to_string(),
            phone: "+15551234567".to_string(),
            code: "111111".to_string(),
            created_at: now - Duration::minutes(10),
            expires_at: now + Duration::seconds(1),
        };
        put_artifact(&h.store, &artifact).await;
        let ok = h
            .service
            .verify_code(ResetMethod::Email, "a@example.com", "111111")
            .await;
        assert!(ok.is_ok());

        artifact.code = "222222".to_string();
        artifact.expires_at = now - Duration::seconds(1);
        put_artifact(&h.store, &artifact).await;
        let expired = h
            .service
            .verify_code(ResetMethod::Email, "a@example.com", "222222")
            .await;
        assert!(matches!(expired, Err(AppError::InvalidOrExpired)));

        let expired_commit = h
            .service
            .commit_password(ResetMethod::Email, "a@example.com", "222222", "abcdef")
            .await;
        assert!(matches!(expired_commit, Err(AppError::InvalidOrExpired)));
    }

    #[tokio::test]
    async fn rerequest_keeps_both_codes_verifiable() {
        let h = harness();
        h.service
            .request_reset(ResetMethod::Email, "a@example.com")
            .await
            .unwrap();
        let first = sent_code(&h.email);
        h.service
            .request_reset(ResetMethod::Email, "a@example.com")
            .await
            .unwrap();
        let second = sent_code(&h.email);

        // Known non-invalidation behavior: codes are keyed independently, so
        // a stale unexpired code still verifies.
        assert!(h
            .service
            .verify_code(ResetMethod::Email, "a@example.com", &first)
            .await
            .is_ok());
        assert!(h
            .service
            .verify_code(ResetMethod::Email, "a@example.com", &second)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn short_password_is_rejected_and_six_chars_accepted() {
        let h = harness();
        h.service
            .request_reset(ResetMethod::Email, "a@example.com")
            .await
            .unwrap();
        let code = sent_code(&h.email);

        let short = h
            .service
            .commit_password(ResetMethod::Email, "a@example.com", &code, "abcde")
            .await;
        assert!(matches!(short, Err(AppError::Validation(_))));

        h.service
            .commit_password(ResetMethod::Email, "a@example.com", &code, "abcdef")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn unknown_contact_is_not_found() {
        let h = harness();
        let missing = h
            .service
            .request_reset(ResetMethod::Email, "nobody@example.com")
            .await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn phone_path_mints_grant_only_on_approved() {
        let h = harness();
        let outcome = h
            .service
            .request_reset(ResetMethod::Phone, "(555) 123-4567")
            .await
            .unwrap();
        assert_eq!(outcome.phone.as_deref(), Some("+15551234567"));
        assert!(outcome.user_id.is_some());

        let user_id = h
            .service
            .verify_code(ResetMethod::Phone, "5551234567", "123456")
            .await
            .unwrap();
        assert!(!user_id.is_empty());
        assert!(h
            .store
            .get(&grant_key("+15551234567"))
            .await
            .unwrap()
            .is_some());

        h.service
            .commit_password(ResetMethod::Phone, "5551234567", "123456", "abcdef")
            .await
            .unwrap();

        // Grant consumed on commit: replay must fail.
        let replay = h
            .service
            .commit_password(ResetMethod::Phone, "5551234567", "123456", "abcdef")
            .await;
        assert!(matches!(replay, Err(AppError::InvalidOrExpired)));
    }

    #[tokio::test]
    async fn phone_path_rejects_non_approved_status() {
        let h = harness_with_otp_status("pending");
        let denied = h
            .service
            .verify_code(ResetMethod::Phone, "5551234567", "123456")
            .await;
        assert!(matches!(denied, Err(AppError::InvalidOrExpired)));
        assert!(h
            .store
            .get(&grant_key("+15551234567"))
            .await
            .unwrap()
            .is_none());

        // No grant, so a commit cannot go through either.
        let commit = h
            .service
            .commit_password(ResetMethod::Phone, "5551234567", "123456", "abcdef")
            .await;
        assert!(matches!(commit, Err(AppError::InvalidOrExpired)));
    }

    #[tokio::test]
    async fn email_code_never_validates_phone_contact() {
        let h = harness();
        h.service
            .request_reset(ResetMethod::Email, "a@example.com")
            .await
            .unwrap();
        let code = sent_code(&h.email);

        // Same code under the phone method must not cross paths.
        let crossed = h
            .service
            .verify_code(ResetMethod::Phone, "nonexistent", &code)
            .await;
        assert!(crossed.is_err());
    }

    #[tokio::test]
    async fn legacy_link_token_roundtrip() {
        let h = harness();
        h.service
            .request_reset(ResetMethod::Email, "a@example.com")
            .await
            .unwrap();
        let sent = h.email.sent.lock().unwrap();
        let (_, body) = sent.last().unwrap();
        let token = body
            .split("token=")
            .nth(1)
            .expect("no link token in email body")
            .trim()
            .to_string();
        drop(sent);

        let email = h.service.verify_link_token(&token).await.unwrap();
        assert_eq!(email, "a@example.com");

        let bogus = h.service.verify_link_token("not-a-token").await;
        assert!(matches!(bogus, Err(AppError::InvalidOrExpired)));
    }
}
