use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: String) -> Self {
        Self { role: ChatRole::System, content }
    }

    pub fn user(content: String) -> Self {
        Self { role: ChatRole::User, content }
    }

    pub fn assistant(content: String) -> Self {
        Self { role: ChatRole::Assistant, content }
    }
}

/// One caller-issued completion request, consumed by a single proxy call.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub tenant_id: String,
    pub user_message: String,
    pub history: Vec<ChatMessage>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

/// Provider-bound call: the assembled message sequence plus sampling
/// parameters. Temperature is optional here so probe calls can leave it to
/// the provider default.
#[derive(Debug, Clone)]
pub struct CompletionCall {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

pub type CompletionStream = BoxStream<'static, Result<String, AppError>>;

#[derive(Debug)]
pub struct CompletionOutcome {
    pub tenant_id: String,
    pub business_name: String,
    pub assistant_message: String,
}

pub struct StreamedCompletion {
    pub tenant_id: String,
    pub business_name: String,
    pub model: String,
    pub stream: CompletionStream,
}

#[derive(Debug, Serialize)]
pub struct TenantSummary {
    pub tenant_id: String,
    pub business_name: String,
    pub username: String,
    pub has_credential: bool,
    pub system_prompt_length: usize,
    pub created_at: DateTime<Utc>,
}
