use std::sync::Arc;
use crate::domain::ports::TenantRepository;
use crate::domain::services::auth_service::AuthService;
use crate::domain::services::completion_service::CompletionService;
use crate::domain::services::credential_vault::CredentialVault;
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub tenant_repo: Arc<dyn TenantRepository>,
    pub vault: Arc<CredentialVault>,
    pub auth_service: Arc<AuthService>,
    pub completion_service: Arc<CompletionService>,
}
