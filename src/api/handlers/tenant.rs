use axum::{extract::{State, Path}, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::dtos::requests::{CreateTenantRequest, UpdateTenantRequest};
use crate::api::extractors::auth::AuthTenant;
use crate::domain::models::tenant::Tenant;
use crate::domain::services::prompt::DEFAULT_SYSTEM_PROMPT;
use std::sync::Arc;
use crate::error::AppError;
use chrono::Utc;
use argon2::{password_hash::SaltString, Argon2, PasswordHasher};
use tracing::info;

const MIN_USERNAME_CHARS: usize = 3;
const MIN_PASSWORD_CHARS: usize = 6;
const MIN_API_KEY_CHARS: usize = 20;
const MIN_SYSTEM_PROMPT_CHARS: usize = 10;

fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| AppError::Internal)?
        .to_string())
}

fn check_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(AppError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_CHARS
        )));
    }
    Ok(())
}

fn check_api_key(api_key: &str) -> Result<(), AppError> {
    if api_key.chars().count() < MIN_API_KEY_CHARS {
        return Err(AppError::Validation(format!(
            "API key must be at least {} characters",
            MIN_API_KEY_CHARS
        )));
    }
    Ok(())
}

fn check_system_prompt(prompt: &str) -> Result<(), AppError> {
    if prompt.chars().count() < MIN_SYSTEM_PROMPT_CHARS {
        return Err(AppError::Validation(format!(
            "System prompt must be at least {} characters",
            MIN_SYSTEM_PROMPT_CHARS
        )));
    }
    Ok(())
}

pub async fn create_tenant(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateTenantRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.username.chars().count() < MIN_USERNAME_CHARS {
        return Err(AppError::Validation(format!(
            "Username must be at least {} characters",
            MIN_USERNAME_CHARS
        )));
    }
    check_password(&payload.password)?;
    if payload.business_name.is_empty() {
        return Err(AppError::Validation("Business name must not be empty".into()));
    }
    check_api_key(&payload.api_key)?;

    let system_prompt = match payload.system_prompt {
        Some(prompt) => {
            check_system_prompt(&prompt)?;
            prompt
        }
        None => DEFAULT_SYSTEM_PROMPT.to_string(),
    };

    let password_hash = hash_password(&payload.password)?;

    let mut tenant = Tenant::new(
        payload.username,
        password_hash,
        payload.business_name,
        system_prompt,
    );
    tenant.api_key_ciphertext = Some(state.vault.encrypt(&payload.api_key)?);

    let created = state.tenant_repo.create(&tenant).await?;

    info!("Tenant created: {}", created.id);

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_tenants(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let tenants = state.tenant_repo.list().await?;
    Ok(Json(tenants))
}

pub async fn get_tenant(
    State(state): State<Arc<AppState>>,
    Path(tenant_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let tenant = state.tenant_repo.find_by_id(&tenant_id).await?
        .ok_or_else(|| AppError::TenantNotFound(format!("Tenant not found: {}", tenant_id)))?;

    Ok(Json(tenant))
}

pub async fn delete_tenant(
    State(state): State<Arc<AppState>>,
    Path(tenant_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.tenant_repo.find_by_id(&tenant_id).await?
        .ok_or_else(|| AppError::TenantNotFound(format!("Tenant not found: {}", tenant_id)))?;

    state.tenant_repo.delete(&tenant_id).await?;

    info!("Tenant deleted: {}", tenant_id);

    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_current_tenant(
    State(state): State<Arc<AppState>>,
    auth: AuthTenant,
) -> Result<impl IntoResponse, AppError> {
    let tenant = state.tenant_repo.find_by_id(&auth.tenant_id).await?
        .ok_or_else(|| AppError::TenantNotFound(format!("Tenant not found: {}", auth.tenant_id)))?;

    Ok(Json(tenant))
}

pub async fn update_current_tenant(
    State(state): State<Arc<AppState>>,
    auth: AuthTenant,
    Json(payload): Json<UpdateTenantRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut tenant = state.tenant_repo.find_by_id(&auth.tenant_id).await?
        .ok_or_else(|| AppError::TenantNotFound(format!("Tenant not found: {}", auth.tenant_id)))?;

    if let Some(name) = payload.business_name {
        if name.is_empty() {
            return Err(AppError::Validation("Business name must not be empty".into()));
        }
        tenant.business_name = name;
    }
    if let Some(key) = payload.api_key {
        check_api_key(&key)?;
        tenant.api_key_ciphertext = Some(state.vault.encrypt(&key)?);
    }
    if let Some(prompt) = payload.system_prompt {
        check_system_prompt(&prompt)?;
        tenant.system_prompt = prompt;
    }
    if let Some(password) = payload.password {
        check_password(&password)?;
        tenant.password_hash = hash_password(&password)?;
    }
    tenant.updated_at = Utc::now();

    let updated = state.tenant_repo.update(&tenant).await?;

    info!("Tenant updated: {}", updated.id);

    Ok(Json(updated))
}
