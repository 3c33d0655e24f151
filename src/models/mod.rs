pub mod friendship;
pub mod notification;
pub mod report;
pub mod reset;
pub mod thought;
pub mod user;
