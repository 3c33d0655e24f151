pub mod auth;
pub mod friends;
pub mod notifications;
pub mod password_reset;
pub mod reports;
pub mod thoughts;
pub mod users;
