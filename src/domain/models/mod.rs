pub mod auth;
pub mod chat;
pub mod tenant;
