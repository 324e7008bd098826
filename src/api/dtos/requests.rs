use serde::Deserialize;

use crate::domain::models::chat::ChatMessage;

#[derive(Deserialize)]
pub struct CreateTenantRequest {
    pub username: String,
    pub password: String,
    pub business_name: String,
    pub api_key: String,
    pub system_prompt: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateTenantRequest {
    pub business_name: Option<String>,
    pub api_key: Option<String>,
    pub system_prompt: Option<String>,
    pub password: Option<String>,
}

// The system role is reserved for the composed instruction block; callers
// can only replay user and assistant turns.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryRole {
    User,
    Assistant,
}

#[derive(Deserialize)]
pub struct HistoryMessage {
    pub role: HistoryRole,
    pub content: String,
}

impl From<HistoryMessage> for ChatMessage {
    fn from(message: HistoryMessage) -> Self {
        match message.role {
            HistoryRole::User => ChatMessage::user(message.content),
            HistoryRole::Assistant => ChatMessage::assistant(message.content),
        }
    }
}

#[derive(Deserialize)]
pub struct ChatRequest {
    pub tenant_id: String,
    pub user_message: String,
    #[serde(default)]
    pub conversation_history: Vec<HistoryMessage>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub stream: bool,
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_temperature() -> f32 {
    0.7
}
