//! OpenAI-compatible provider implementation.
//!
//! Talks to any endpoint exposing `/v1/chat/completions` (OpenAI, Azure
//! proxies, Ollama, vLLM, ...). Non-streaming only; tool calls and usage
//! are parsed from the first choice.

use async_trait::async_trait;
use chatloop_core::error::ProviderError;
use chatloop_core::message::{Message, MessageToolCall, Role};
use chatloop_core::provider::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        })
    }

    /// OpenAI itself.
    pub fn openai(api_key: impl Into<String>) -> Result<Self, ProviderError> {
        Self::new("openai", "https://api.openai.com/v1", api_key)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn to_api_messages(messages: &[Message]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|m| ApiMessage {
                role: match m.role {
                    Role::User => "user".into(),
                    Role::Assistant => "assistant".into(),
                    Role::System => "system".into(),
                    Role::Tool => "tool".into(),
                },
                content: Some(m.content.clone()),
                tool_calls: if m.tool_calls.is_empty() {
                    None
                } else {
                    Some(
                        m.tool_calls
                            .iter()
                            .map(|tc| ApiToolCall {
                                id: tc.id.clone(),
                                r#type: "function".into(),
                                function: ApiFunction {
                                    name: tc.name.clone(),
                                    arguments: tc.arguments.clone(),
                                },
                            })
                            .collect(),
                    )
                },
                tool_call_id: m.tool_call_id.clone(),
            })
            .collect()
    }

    fn to_api_tools(tools: &[ToolDefinition]) -> Vec<ApiToolDefinition> {
        tools
            .iter()
            .map(|t| ApiToolDefinition {
                r#type: "function".into(),
                function: ApiToolFunction {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.parameters.clone(),
                },
            })
            .collect()
    }

    fn request_body(request: &ProviderRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model,
            "messages": Self::to_api_messages(&request.messages),
            "temperature": request.temperature,
            "stream": false,
        });

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        if !request.tools.is_empty() {
            body["tools"] = serde_json::json!(Self::to_api_tools(&request.tools));
        }

        if !request.stop.is_empty() {
            body["stop"] = serde_json::json!(request.stop);
        }

        body
    }

    fn into_response(api_response: ApiResponse) -> Result<ProviderResponse, ProviderError> {
        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::ApiError {
                status_code: 200,
                message: "No choices in response".into(),
            })?;

        let tool_calls: Vec<MessageToolCall> = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| MessageToolCall {
                id: tc.id,
                name: tc.function.name,
                arguments: tc.function.arguments,
            })
            .collect();

        let message = Message {
            id: uuid::Uuid::new_v4().to_string(),
            role: Role::Assistant,
            content: choice.message.content.unwrap_or_default(),
            tool_calls,
            tool_call_id: None,
            timestamp: chrono::Utc::now(),
        };

        let usage = api_response.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(ProviderResponse {
            message,
            usage,
            model: api_response.model,
        })
    }
}

/// Map a non-success HTTP status to the matching provider error.
fn status_error(status: u16, body: String) -> ProviderError {
    match status {
        429 => ProviderError::RateLimited {
            retry_after_secs: 5,
        },
        401 | 403 => ProviderError::AuthenticationFailed(
            "Invalid API key or insufficient permissions".into(),
        ),
        _ => ProviderError::ApiError {
            status_code: status,
            message: body,
        },
    }
}

#[async_trait]
impl chatloop_core::Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = Self::request_body(&request);

        debug!(
            provider = %self.name,
            model = %request.model,
            messages = request.messages.len(),
            "Sending completion request"
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Provider returned error");
            return Err(status_error(status, error_body));
        }

        let api_response: ApiResponse =
            response.json().await.map_err(|e| ProviderError::ApiError {
                status_code: 200,
                message: format!("Failed to parse response: {e}"),
            })?;

        Self::into_response(api_response)
    }

    async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Ok(Vec::new());
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(model_ids(&body))
    }

    async fn health_check(&self) -> Result<bool, ProviderError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(response.status().is_success())
    }
}

fn model_ids(body: &serde_json::Value) -> Vec<String> {
    body["data"]
        .as_array()
        .map(|arr| {
            arr.iter()
                .filter_map(|m| m["id"].as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ApiToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolCall {
    id: String,
    r#type: String,
    function: ApiFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunction {
    name: String,
    arguments: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolDefinition {
    r#type: String,
    function: ApiToolFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    model: String,
    choices: Vec<ApiChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatloop_core::Provider;

    #[test]
    fn openai_constructor() {
        let provider = OpenAiCompatProvider::openai("sk-test").unwrap();
        assert_eq!(provider.name(), "openai");
        assert!(provider.base_url.contains("api.openai.com"));
    }

    #[test]
    fn message_conversion() {
        let messages = vec![Message::system("You are helpful"), Message::user("Hello")];
        let api_messages = OpenAiCompatProvider::to_api_messages(&messages);
        assert_eq!(api_messages.len(), 2);
        assert_eq!(api_messages[0].role, "system");
        assert_eq!(api_messages[1].role, "user");
    }

    #[test]
    fn message_conversion_tool_response() {
        let msg = Message::tool_result("call_1", "25.5 + 10.8 = 36.3");
        let api_msgs = OpenAiCompatProvider::to_api_messages(&[msg]);
        assert_eq!(api_msgs[0].role, "tool");
        assert_eq!(api_msgs[0].tool_call_id.as_deref(), Some("call_1"));
    }

    #[test]
    fn body_omits_unset_fields() {
        let request = ProviderRequest::new("gpt-3.5-turbo", vec![Message::user("hi")], 0.05);
        let body = OpenAiCompatProvider::request_body(&request);
        assert_eq!(body["model"], "gpt-3.5-turbo");
        assert_eq!(body["stream"], false);
        assert!(body.get("max_tokens").is_none());
        assert!(body.get("tools").is_none());
        assert!(body.get("stop").is_none());
    }

    #[test]
    fn body_includes_tools_and_limits() {
        let mut request = ProviderRequest::new("gpt-3.5-turbo-16k", vec![], 0.0);
        request.max_tokens = Some(256);
        request.tools = vec![ToolDefinition {
            name: "calculator".into(),
            description: "Useful for performing calculations".into(),
            parameters: serde_json::json!({"type": "object"}),
        }];
        let body = OpenAiCompatProvider::request_body(&request);
        assert_eq!(body["max_tokens"], 256);
        assert_eq!(body["tools"][0]["type"], "function");
        assert_eq!(body["tools"][0]["function"]["name"], "calculator");
    }

    #[test]
    fn parse_text_completion() {
        let data = r#"{
            "model": "gpt-3.5-turbo-0125",
            "choices": [{"message": {"role": "assistant", "content": "Is it a mammal?"}}],
            "usage": {"prompt_tokens": 42, "completion_tokens": 5, "total_tokens": 47}
        }"#;
        let api: ApiResponse = serde_json::from_str(data).unwrap();
        let response = OpenAiCompatProvider::into_response(api).unwrap();
        assert_eq!(response.message.role, Role::Assistant);
        assert_eq!(response.message.content, "Is it a mammal?");
        assert_eq!(response.model, "gpt-3.5-turbo-0125");
        assert_eq!(response.usage.unwrap().total_tokens, 47);
    }

    #[test]
    fn parse_tool_call_completion() {
        let data = r#"{
            "model": "gpt-3.5-turbo-16k",
            "choices": [{"message": {"role": "assistant", "content": null, "tool_calls": [
                {"id": "call_abc", "type": "function",
                 "function": {"name": "calculator", "arguments": "{\"expression\":\"25.5 + 10.8\"}"}}
            ]}}]
        }"#;
        let api: ApiResponse = serde_json::from_str(data).unwrap();
        let response = OpenAiCompatProvider::into_response(api).unwrap();
        assert_eq!(response.message.content, "");
        assert_eq!(response.message.tool_calls.len(), 1);
        assert_eq!(response.message.tool_calls[0].name, "calculator");
        assert!(response.usage.is_none());
    }

    #[test]
    fn empty_choices_is_an_error() {
        let api: ApiResponse = serde_json::from_str(r#"{"model":"m","choices":[]}"#).unwrap();
        let err = OpenAiCompatProvider::into_response(api).unwrap_err();
        assert!(err.to_string().contains("No choices"));
    }

    #[test]
    fn status_mapping() {
        assert!(matches!(
            status_error(429, String::new()),
            ProviderError::RateLimited { .. }
        ));
        assert!(matches!(
            status_error(401, String::new()),
            ProviderError::AuthenticationFailed(_)
        ));
        assert!(matches!(
            status_error(500, "boom".into()),
            ProviderError::ApiError { status_code: 500, .. }
        ));
    }

    #[test]
    fn model_listing_parse() {
        let body = serde_json::json!({"data": [{"id": "gpt-4o"}, {"id": "gpt-4o-mini"}, {}]});
        assert_eq!(model_ids(&body), vec!["gpt-4o", "gpt-4o-mini"]);
        assert!(model_ids(&serde_json::json!({})).is_empty());
    }
}
