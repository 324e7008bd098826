use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::models::chat::{
    ChatMessage, CompletionCall, CompletionOutcome, CompletionRequest, StreamedCompletion,
    TenantSummary,
};
use crate::domain::models::tenant::{CredentialState, Tenant};
use crate::domain::ports::{LlmService, TenantRepository};
use crate::domain::services::credential_vault::CredentialVault;
use crate::domain::services::prompt::{compose, PLATFORM_POLICY};
use crate::error::AppError;

pub const AVAILABLE_MODELS: [&str; 5] = [
    "gpt-4o",
    "gpt-4o-mini",
    "gpt-4-turbo",
    "gpt-4",
    "gpt-3.5-turbo",
];

const VALIDATION_MODEL: &str = "gpt-3.5-turbo";
const VALIDATION_MAX_TOKENS: u32 = 5;
const PREVIEW_CHARS: usize = 200;

#[derive(Debug)]
pub struct ModelCatalog {
    pub tenant: Tenant,
    pub models: Vec<String>,
}

#[derive(Debug)]
pub struct CredentialCheck {
    pub tenant: Tenant,
    pub valid: bool,
}

pub struct TenantAiInfo {
    pub summary: TenantSummary,
    pub system_prompt_preview: String,
}

/// Orchestrates one completion call: resolve the tenant, decrypt its
/// credential, compose the instruction block, and hand the assembled
/// message sequence to the provider. Holds no per-call state; the tenant is
/// re-read and the credential re-decrypted on every call, so an update
/// between two calls is always picked up by the second.
pub struct CompletionService {
    tenants: Arc<dyn TenantRepository>,
    vault: Arc<CredentialVault>,
    llm: Arc<dyn LlmService>,
}

struct ResolvedTenant {
    tenant: Tenant,
    api_key: String,
}

impl CompletionService {
    pub fn new(
        tenants: Arc<dyn TenantRepository>,
        vault: Arc<CredentialVault>,
        llm: Arc<dyn LlmService>,
    ) -> Self {
        Self { tenants, vault, llm }
    }

    pub async fn find_tenant(&self, tenant_id: &str) -> Result<Tenant, AppError> {
        self.tenants
            .find_by_id(tenant_id)
            .await?
            .ok_or_else(|| AppError::TenantNotFound(format!("Tenant not found: {}", tenant_id)))
    }

    async fn resolve(&self, tenant_id: &str) -> Result<ResolvedTenant, AppError> {
        let tenant = self.find_tenant(tenant_id).await?;

        let api_key = match tenant.credential_state() {
            CredentialState::NotConfigured => {
                return Err(AppError::CredentialNotConfigured(tenant.business_name.clone()));
            }
            CredentialState::Ciphertext(ciphertext) => self.vault.decrypt(ciphertext)?,
        };

        debug!(tenant_id = %tenant.id, "credential decrypted");
        Ok(ResolvedTenant { tenant, api_key })
    }

    // Instruction entry first, caller history in original order, the new
    // user turn last. The ordering is part of the contract.
    fn assemble_messages(
        &self,
        tenant: &Tenant,
        request: &CompletionRequest,
    ) -> Result<Vec<ChatMessage>, AppError> {
        let mut messages = Vec::with_capacity(request.history.len() + 2);
        messages.push(ChatMessage::system(compose(PLATFORM_POLICY, &tenant.system_prompt)));

        for turn in &request.history {
            if turn.content.is_empty() {
                return Err(AppError::Validation("History messages must not be empty".into()));
            }
            messages.push(turn.clone());
        }

        messages.push(ChatMessage::user(request.user_message.clone()));
        Ok(messages)
    }

    pub async fn complete(&self, request: &CompletionRequest) -> Result<CompletionOutcome, AppError> {
        let resolved = self.resolve(&request.tenant_id).await?;
        let messages = self.assemble_messages(&resolved.tenant, request)?;

        let call = CompletionCall {
            model: request.model.clone(),
            messages,
            temperature: Some(request.temperature),
            max_tokens: request.max_tokens,
        };

        info!(tenant_id = %resolved.tenant.id, model = %call.model, "chat completion requested");
        let assistant_message = self.llm.complete(&resolved.api_key, &call).await?;

        Ok(CompletionOutcome {
            tenant_id: resolved.tenant.id,
            business_name: resolved.tenant.business_name,
            assistant_message,
        })
    }

    pub async fn complete_stream(&self, request: &CompletionRequest) -> Result<StreamedCompletion, AppError> {
        let resolved = self.resolve(&request.tenant_id).await?;
        let messages = self.assemble_messages(&resolved.tenant, request)?;

        let call = CompletionCall {
            model: request.model.clone(),
            messages,
            temperature: Some(request.temperature),
            max_tokens: request.max_tokens,
        };

        info!(tenant_id = %resolved.tenant.id, model = %call.model, "streaming chat completion requested");
        let stream = self.llm.complete_stream(&resolved.api_key, &call).await?;

        Ok(StreamedCompletion {
            tenant_id: resolved.tenant.id,
            business_name: resolved.tenant.business_name,
            model: call.model,
            stream,
        })
    }

    // Static allowlist; never queried from the provider. The lookup is only
    // an existence check so the response can carry attribution.
    pub async fn available_models(&self, tenant_id: &str) -> Result<ModelCatalog, AppError> {
        let tenant = self.find_tenant(tenant_id).await?;
        let models = AVAILABLE_MODELS.iter().map(|m| m.to_string()).collect();
        Ok(ModelCatalog { tenant, models })
    }

    /// Probes the provider with one minimal completion. Provider rejection
    /// is an expected outcome and maps to `valid: false`; missing tenants,
    /// missing credentials, and decrypt failures still propagate as errors.
    pub async fn validate_credential(&self, tenant_id: &str) -> Result<CredentialCheck, AppError> {
        let resolved = self.resolve(tenant_id).await?;

        let probe = CompletionCall {
            model: VALIDATION_MODEL.to_string(),
            messages: vec![ChatMessage::user("test".to_string())],
            temperature: None,
            max_tokens: Some(VALIDATION_MAX_TOKENS),
        };

        let valid = match self.llm.complete(&resolved.api_key, &probe).await {
            Ok(_) => {
                info!(tenant_id = %resolved.tenant.id, "API key validated");
                true
            }
            Err(e) => {
                warn!(tenant_id = %resolved.tenant.id, "API key validation failed: {}", e);
                false
            }
        };

        Ok(CredentialCheck { tenant: resolved.tenant, valid })
    }

    pub async fn tenant_summary(&self, tenant_id: &str) -> Result<TenantAiInfo, AppError> {
        let tenant = self.find_tenant(tenant_id).await?;

        let composed = compose(PLATFORM_POLICY, &tenant.system_prompt);
        let system_prompt_preview = if composed.chars().count() > PREVIEW_CHARS {
            let head: String = composed.chars().take(PREVIEW_CHARS).collect();
            format!("{}...", head)
        } else {
            composed
        };

        let summary = TenantSummary {
            tenant_id: tenant.id.clone(),
            business_name: tenant.business_name.clone(),
            username: tenant.username.clone(),
            has_credential: tenant.has_credential(),
            system_prompt_length: tenant.system_prompt.chars().count(),
            created_at: tenant.created_at,
        };

        Ok(TenantAiInfo { summary, system_prompt_preview })
    }
}
