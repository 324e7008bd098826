pub mod auth_service;
pub mod completion_service;
pub mod credential_vault;
pub mod prompt;
