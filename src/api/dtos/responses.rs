use serde::Serialize;

use crate::domain::models::chat::TenantSummary;

#[derive(Serialize)]
pub struct ChatResponse {
    pub tenant_id: String,
    pub business_name: String,
    pub user_message: String,
    pub assistant_message: String,
    pub model: String,
    pub success: bool,
}

#[derive(Serialize)]
pub struct ModelsResponse {
    pub tenant_id: String,
    pub business_name: String,
    pub available_models: Vec<String>,
}

#[derive(Serialize)]
pub struct ValidationResponse {
    pub tenant_id: String,
    pub business_name: String,
    pub credential_valid: bool,
    pub message: String,
}

#[derive(Serialize)]
pub struct TenantInfoResponse {
    pub success: bool,
    pub tenant_info: TenantSummary,
    pub system_prompt_preview: String,
}
