pub mod email_service;
pub mod normalize;
pub mod otp_service;
pub mod recovery_service;
pub mod token_store;
pub mod user_store;
