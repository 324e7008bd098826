use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use crate::state::AppState;
use crate::api::dtos::{
    requests::ChatRequest,
    responses::{ChatResponse, ModelsResponse, TenantInfoResponse, ValidationResponse},
};
use crate::domain::models::chat::CompletionRequest;
use crate::error::AppError;
use std::sync::Arc;

const MAX_USER_MESSAGE_CHARS: usize = 5000;

fn validate_chat_request(payload: &ChatRequest) -> Result<(), AppError> {
    let length = payload.user_message.chars().count();
    if length == 0 || length > MAX_USER_MESSAGE_CHARS {
        return Err(AppError::Validation(format!(
            "user_message must be between 1 and {} characters",
            MAX_USER_MESSAGE_CHARS
        )));
    }
    if !(0.0..=2.0).contains(&payload.temperature) {
        return Err(AppError::Validation(
            "temperature must be between 0.0 and 2.0".into(),
        ));
    }
    Ok(())
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ChatRequest>,
) -> Result<Response, AppError> {
    validate_chat_request(&payload)?;

    let stream = payload.stream;
    let user_message = payload.user_message;

    let request = CompletionRequest {
        tenant_id: payload.tenant_id,
        user_message: user_message.clone(),
        history: payload.conversation_history.into_iter().map(Into::into).collect(),
        model: payload.model,
        temperature: payload.temperature,
        max_tokens: payload.max_tokens,
    };

    if stream {
        let streamed = state.completion_service.complete_stream(&request).await?;

        let response = Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .header("X-Tenant-Id", streamed.tenant_id)
            .header("X-Model", streamed.model)
            .body(Body::from_stream(streamed.stream))
            .map_err(|_| AppError::Internal)?;

        return Ok(response);
    }

    let outcome = state.completion_service.complete(&request).await?;

    Ok(Json(ChatResponse {
        tenant_id: outcome.tenant_id,
        business_name: outcome.business_name,
        user_message,
        assistant_message: outcome.assistant_message,
        model: request.model,
        success: true,
    })
    .into_response())
}

pub async fn list_models(
    State(state): State<Arc<AppState>>,
    Path(tenant_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let catalog = state.completion_service.available_models(&tenant_id).await?;

    Ok(Json(ModelsResponse {
        tenant_id: catalog.tenant.id,
        business_name: catalog.tenant.business_name,
        available_models: catalog.models,
    }))
}

pub async fn validate_credential(
    State(state): State<Arc<AppState>>,
    Path(tenant_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let check = state.completion_service.validate_credential(&tenant_id).await?;

    let message = if check.valid {
        "API key is valid and working"
    } else {
        "API key validation failed"
    };

    Ok(Json(ValidationResponse {
        tenant_id: check.tenant.id,
        business_name: check.tenant.business_name,
        credential_valid: check.valid,
        message: message.to_string(),
    }))
}

pub async fn tenant_info(
    State(state): State<Arc<AppState>>,
    Path(tenant_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let info = state.completion_service.tenant_summary(&tenant_id).await?;

    Ok(Json(TenantInfoResponse {
        success: true,
        tenant_info: info.summary,
        system_prompt_preview: info.system_prompt_preview,
    }))
}
