// src/handlers/password_reset.rs
//
// Account recovery endpoints. All four are public (no bearer token): the
// caller proves ownership through the emailed code or the provider OTP.

use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::errors::{AppError, Result};
use crate::models::reset::ResetMethod;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub method: Option<String>,
    pub contact: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyResetCodeRequest {
    pub method: Option<String>,
    pub contact: Option<String>,
    pub code: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub method: Option<String>,
    pub contact: Option<String>,
    pub code: Option<String>,
    pub new_password: Option<String>,
}

fn require<'a>(field: &'a Option<String>, name: &str) -> Result<&'a str> {
    field
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation(format!("Missing required field: {}", name)))
}

fn parse_method(raw: &Option<String>) -> Result<ResetMethod> {
    let raw = require(raw, "method")?;
    ResetMethod::parse(raw)
        .ok_or_else(|| AppError::Validation("Method must be 'email' or 'phone'".to_string()))
}

pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<Json<Value>> {
    let method = parse_method(&req.method)?;
    let contact = require(&req.contact, "contact")?;

    let outcome = state.recovery.request_reset(method, contact).await?;

    let mut body = json!({
        "message": match method {
            ResetMethod::Email => "Password reset code sent to your email!",
            ResetMethod::Phone => "Verification code sent to your phone!",
        },
        "method": method.as_str(),
    });
    if let Some(user_id) = outcome.user_id {
        body["userId"] = json!(user_id);
    }
    if let Some(phone) = outcome.phone {
        body["phone"] = json!(phone);
    }

    Ok(Json(body))
}

pub async fn verify_reset_code(
    State(state): State<AppState>,
    Json(req): Json<VerifyResetCodeRequest>,
) -> Result<Json<Value>> {
    let method = parse_method(&req.method)?;
    let contact = require(&req.contact, "contact")?;
    let code = require(&req.code, "code")?;

    let user_id = state.recovery.verify_code(method, contact, code).await?;

    Ok(Json(json!({
        "message": "Code verified",
        "userId": user_id,
    })))
}

pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<Value>> {
    let method = parse_method(&req.method)?;
    let contact = require(&req.contact, "contact")?;
    let code = require(&req.code, "code")?;
    let new_password = require(&req.new_password, "newPassword")?;

    state
        .recovery
        .commit_password(method, contact, code, new_password)
        .await?;

    Ok(Json(json!({
        "message": "Password updated successfully!",
    })))
}

/// Legacy email-link flow.
pub async fn verify_reset_token(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<Value>> {
    let email = state.recovery.verify_link_token(&token).await?;

    Ok(Json(json!({
        "valid": true,
        "email": email,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_method_is_a_validation_error() {
        let missing = parse_method(&None);
        assert!(matches!(missing, Err(AppError::Validation(_))));
    }

    #[test]
    fn unknown_method_is_a_validation_error() {
        let unknown = parse_method(&Some("sms".to_string()));
        assert!(matches!(unknown, Err(AppError::Validation(_))));

        assert_eq!(
            parse_method(&Some("email".to_string())).unwrap(),
            ResetMethod::Email
        );
        assert_eq!(
            parse_method(&Some("phone".to_string())).unwrap(),
            ResetMethod::Phone
        );
    }

    #[test]
    fn missing_or_empty_fields_are_validation_errors() {
        let absent = require(&None, "contact");
        assert!(matches!(absent, Err(AppError::Validation(_))));

        let empty_contact = Some(String::new());
        let empty = require(&empty_contact, "contact");
        assert!(matches!(empty, Err(AppError::Validation(_))));

        assert_eq!(
            require(&Some("a@example.com".to_string()), "contact").unwrap(),
            "a@example.com"
        );
    }
}
