use crate::domain::models::{
    chat::{CompletionCall, CompletionStream},
    tenant::Tenant,
};
use crate::error::AppError;
use async_trait::async_trait;

#[async_trait]
pub trait TenantRepository: Send + Sync {
    async fn create(&self, tenant: &Tenant) -> Result<Tenant, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Tenant>, AppError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<Tenant>, AppError>;
    async fn list(&self) -> Result<Vec<Tenant>, AppError>;
    async fn update(&self, tenant: &Tenant) -> Result<Tenant, AppError>;
    async fn delete(&self, id: &str) -> Result<(), AppError>;
}

/// Provider adapter. The decrypted API key is passed per call; adapters must
/// not retain it or reuse it across calls.
#[async_trait]
pub trait LlmService: Send + Sync {
    async fn complete(&self, api_key: &str, call: &CompletionCall) -> Result<String, AppError>;

    /// Opens a streaming completion. Failures before the first chunk surface
    /// as a plain error; faults after that terminate the stream with an
    /// `Err` item. Dropping the stream cancels the upstream request.
    async fn complete_stream(&self, api_key: &str, call: &CompletionCall) -> Result<CompletionStream, AppError>;
}
