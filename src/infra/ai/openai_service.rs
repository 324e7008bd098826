use crate::domain::models::chat::{CompletionCall, CompletionStream};
use crate::domain::ports::LlmService;
use crate::error::AppError;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument, warn};

pub struct OpenAiService {
    client: Client,
    base_url: String,
}

// One bearer-authenticated view of the API per call. Built fresh from the
// caller's key every time and dropped with the call, so a key update takes
// effect on the very next request.
struct TenantClient {
    http: Client,
    chat_url: String,
    bearer: String,
}

impl TenantClient {
    async fn send(&self, payload: &OpenAiRequest) -> Result<reqwest::Response, AppError> {
        self.http
            .post(&self.chat_url)
            .header(header::AUTHORIZATION, self.bearer.as_str())
            .header(header::CONTENT_TYPE, "application/json")
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                error!("OpenAI network error: {:?}", e);
                AppError::InternalWithMsg(format!("AI network error: {}", e))
            })
    }
}

impl OpenAiService {
    pub fn new(base_url: String) -> Self {
        // No request timeout. Completions can legitimately run for minutes;
        // callers cancel by dropping the response stream.
        Self { client: Client::new(), base_url }
    }

    fn client_for(&self, api_key: &str) -> TenantClient {
        TenantClient {
            http: self.client.clone(),
            chat_url: format!("{}/chat/completions", self.base_url),
            bearer: format!("Bearer {}", api_key),
        }
    }

    async fn check_status(&self, response: reqwest::Response) -> Result<reqwest::Response, AppError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        error!("OpenAI API error {}: {}", status, text);
        Err(AppError::Provider(format!("OpenAI API error: {} - {}", status, text)))
    }
}

#[async_trait]
impl LlmService for OpenAiService {
    #[instrument(skip(self, api_key, call), fields(model = %call.model))]
    async fn complete(&self, api_key: &str, call: &CompletionCall) -> Result<String, AppError> {
        let tenant_client = self.client_for(api_key);
        let payload = build_payload(call, false);

        let response = tenant_client.send(&payload).await?;
        let response = self.check_status(response).await?;

        let body: OpenAiResponse = response.json().await.map_err(|e| {
            error!("Failed to parse OpenAI response JSON: {:?}", e);
            AppError::InternalWithMsg("AI response could not be parsed".to_string())
        })?;

        extract_content(body)
    }

    #[instrument(skip(self, api_key, call), fields(model = %call.model))]
    async fn complete_stream(
        &self,
        api_key: &str,
        call: &CompletionCall,
    ) -> Result<CompletionStream, AppError> {
        let tenant_client = self.client_for(api_key);
        let payload = build_payload(call, true);

        // The request is sent and the status line checked before a stream is
        // handed back; a rejected key or model surfaces as a plain error,
        // never as a poisoned stream.
        let response = tenant_client.send(&payload).await?;
        let response = self.check_status(response).await?;

        let stream = async_stream::stream! {
            let mut bytes_stream = response.bytes_stream();
            let mut buffer = String::new();

            while let Some(chunk) = bytes_stream.next().await {
                let bytes = match chunk {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        warn!("OpenAI stream transport error: {:?}", e);
                        yield Err(AppError::InternalWithMsg(format!("AI stream error: {}", e)));
                        return;
                    }
                };

                buffer.push_str(&String::from_utf8_lossy(&bytes));

                // SSE events arrive line-delimited; a chunk boundary can fall
                // mid-line, so only complete lines leave the buffer.
                while let Some(newline_pos) = buffer.find('\n') {
                    let line = buffer[..newline_pos].trim().to_string();
                    buffer = buffer[newline_pos + 1..].to_string();

                    if line.is_empty() {
                        continue;
                    }

                    if let Some(data) = line.strip_prefix("data: ") {
                        if data == "[DONE]" {
                            return;
                        }

                        match serde_json::from_str::<OpenAiStreamChunk>(data) {
                            Ok(chunk) => {
                                let content = chunk
                                    .choices
                                    .into_iter()
                                    .next()
                                    .and_then(|c| c.delta.content);
                                if let Some(content) = content {
                                    if !content.is_empty() {
                                        yield Ok(content);
                                    }
                                }
                            }
                            Err(e) => {
                                debug!("Skipping unparseable stream chunk: {} - data: {}", e, data);
                            }
                        }
                    }
                }
            }
        };

        Ok(stream.boxed())
    }
}

fn build_payload(call: &CompletionCall, stream: bool) -> OpenAiRequest {
    OpenAiRequest {
        model: call.model.clone(),
        messages: call
            .messages
            .iter()
            .map(|m| OpenAiMessage {
                role: m.role.as_str().to_string(),
                content: m.content.clone(),
            })
            .collect(),
        temperature: call.temperature,
        max_tokens: call.max_tokens,
        stream,
    }
}

fn extract_content(body: OpenAiResponse) -> Result<String, AppError> {
    body.choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| {
            error!("OpenAI response had no assistant content");
            AppError::InternalWithMsg("AI response missing content".to_string())
        })
}

// OpenAI wire types

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiStreamChunk {
    choices: Vec<OpenAiStreamChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiStreamChoice {
    delta: OpenAiStreamDelta,
}

#[derive(Debug, Deserialize)]
struct OpenAiStreamDelta {
    content: Option<String>,
}
