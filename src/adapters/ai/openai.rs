//! OpenAI Responder - remote adapter for OpenAI-compatible chat APIs.
//!
//! Sends the conversation to the chat-completions endpoint with a psychological
//! first-aid system prompt and a JSON response contract, and maps the reply
//! into a [`SupportReply`].
//!
//! Two rules this adapter must uphold for the orchestrator's resilience model:
//!
//! - Any transport error or non-2xx status is a failed call. It never
//!   fabricates a success for true unavailability, and it never retries
//!   internally - retries are the orchestrator's job via candidate
//!   fallthrough.
//! - A 2xx response whose body doesn't match the expected JSON shape is NOT
//!   a failure. The adapter synthesizes a best-effort default reply so that
//!   a flaky upstream JSON contract cannot trip the circuit breaker.

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::{exercises, risk};
use crate::ports::{
    ChatMessage, CrisisAnalysis, CrisisSupport, MessageRole, PersonalityConfig, Responder,
    ResponderError, RiskLevel, SupportReply,
};

/// System prompt defining the supportive-reply JSON contract.
const SYSTEM_PROMPT: &str = "You are a compassionate AI assistant providing psychological first aid \
for Indian college students. Listen empathetically, validate feelings, offer evidence-based coping \
strategies, support study stress management, and recommend professional help when needed. Be warm, \
culturally sensitive, and non-judgmental; you are not a replacement for professional care. If you \
detect high-risk language (self-harm, suicide ideation), immediately recommend crisis resources.\n\n\
Always respond with JSON containing:\n\
- message: your supportive response\n\
- supportiveActions: array of 2-3 specific actions the user can take\n\
- riskLevel: \"low\", \"moderate\", or \"high\"\n\
- escalationRequired: boolean (true if immediate professional help is needed)";

/// Configuration for the OpenAI responder.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// API key for authentication.
    api_key: Secret<String>,
    /// Model to use.
    pub model: String,
    /// Base URL for the API (default: https://api.openai.com).
    pub base_url: String,
    /// Transport-level request timeout.
    pub timeout: Duration,
    /// Timeout for the liveness probe, independent of the request timeout.
    pub probe_timeout: Duration,
}

impl OpenAiConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com".to_string(),
            timeout: Duration::from_secs(30),
            probe_timeout: Duration::from_secs(5),
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the transport timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// OpenAI-compatible chat API responder.
pub struct OpenAiResponder {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiResponder {
    /// Creates a new responder with the given configuration.
    pub fn new(config: OpenAiConfig) -> Result<Self, ResponderError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| ResponderError::Internal(format!("failed to build HTTP client: {err}")))?;

        Ok(Self { config, client })
    }

    fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.config.base_url)
    }

    fn models_url(&self) -> String {
        format!("{}/v1/models", self.config.base_url)
    }

    /// Converts the conversation into the wire request.
    fn to_wire_request(
        &self,
        messages: &[ChatMessage],
        personality: Option<&PersonalityConfig>,
    ) -> WireRequest {
        let mut system_prompt = SYSTEM_PROMPT.to_string();
        if let Some(custom) = personality.and_then(|p| p.custom_prompt.as_deref()) {
            system_prompt.push_str("\n\nAdditional personality instructions: ");
            system_prompt.push_str(custom);
        }

        let mut wire_messages = vec![WireMessage {
            role: "system".to_string(),
            content: system_prompt,
        }];
        for msg in messages {
            let role = match msg.role {
                MessageRole::System => "system",
                MessageRole::User => "user",
                MessageRole::Assistant => "assistant",
            };
            wire_messages.push(WireMessage {
                role: role.to_string(),
                content: msg.content.clone(),
            });
        }

        WireRequest {
            model: self.config.model.clone(),
            messages: wire_messages,
            response_format: ResponseFormat {
                format_type: "json_object".to_string(),
            },
            temperature: 0.7,
            max_tokens: 1000,
        }
    }

    fn map_transport_error(&self, e: reqwest::Error) -> ResponderError {
        if e.is_timeout() {
            ResponderError::timeout("openai", self.config.timeout.as_millis() as u64)
        } else if e.is_connect() {
            ResponderError::network(format!("Connection failed: {}", e))
        } else {
            ResponderError::network(e.to_string())
        }
    }

    /// Maps a non-2xx status into a typed error.
    async fn handle_response_status(&self, response: Response) -> Result<Response, ResponderError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();

        match status.as_u16() {
            401 => Err(ResponderError::AuthenticationFailed),
            429 => Err(ResponderError::unavailable(format!(
                "rate limited: {}",
                error_body
            ))),
            400 => Err(ResponderError::InvalidRequest(error_body)),
            500..=599 => Err(ResponderError::unavailable(format!(
                "server error {}: {}",
                status, error_body
            ))),
            _ => Err(ResponderError::network(format!(
                "unexpected status {}: {}",
                status, error_body
            ))),
        }
    }

    /// Extracts a [`SupportReply`] from the model's JSON content.
    ///
    /// Missing or malformed fields degrade to safe defaults rather than
    /// failing the call.
    fn reply_from_content(content: &str) -> SupportReply {
        let parsed: serde_json::Value = serde_json::from_str(content).unwrap_or_default();

        let message = parsed
            .get("message")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .unwrap_or(
                "I'm here to support you. Could you tell me more about how you're feeling?",
            )
            .to_string();

        let supportive_actions = parsed
            .get("supportiveActions")
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|i| i.as_str().map(str::to_string))
                    .collect::<Vec<_>>()
            })
            .filter(|actions| !actions.is_empty())
            .unwrap_or_else(|| {
                vec![
                    "Take 5 deep breaths slowly".to_string(),
                    "Talk to a trusted friend or counselor".to_string(),
                    "Practice a grounding exercise".to_string(),
                ]
            });

        let risk_level = parsed
            .get("riskLevel")
            .and_then(|v| serde_json::from_value::<RiskLevel>(v.clone()).ok())
            .unwrap_or(RiskLevel::Low);

        let escalation_required = parsed
            .get("escalationRequired")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        SupportReply {
            message,
            supportive_actions,
            risk_level,
            escalation_required,
        }
    }
}

#[async_trait]
impl Responder for OpenAiResponder {
    async fn generate_response(
        &self,
        messages: &[ChatMessage],
        personality: Option<&PersonalityConfig>,
    ) -> Result<SupportReply, ResponderError> {
        let wire_request = self.to_wire_request(messages, personality);

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(self.config.api_key())
            .json(&wire_request)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let response = self.handle_response_status(response).await?;

        // From here on the call has succeeded; shape mismatches degrade to
        // defaults instead of failing.
        let body: serde_json::Value = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("openai returned an unparseable body: {}", e);
                return Ok(Self::reply_from_content(""));
            }
        };

        let content = body
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .unwrap_or("");

        Ok(Self::reply_from_content(content))
    }

    async fn is_available(&self) -> bool {
        let result = self
            .client
            .get(self.models_url())
            .bearer_auth(self.config.api_key())
            .timeout(self.config.probe_timeout)
            .send()
            .await;

        match result {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn crisis_support(&self) -> Option<&dyn CrisisSupport> {
        Some(self)
    }
}

#[async_trait]
impl CrisisSupport for OpenAiResponder {
    async fn analyze_for_crisis(&self, message: &str) -> Result<CrisisAnalysis, ResponderError> {
        // Keyword analysis keeps this cheap and deterministic; the model is
        // reserved for reply generation.
        Ok(risk::analyze(message))
    }

    async fn guided_exercise(&self, kind: &str) -> Result<Vec<String>, ResponderError> {
        Ok(exercises::steps_for(kind))
    }
}

// ----- Wire types -----

#[derive(Debug, Serialize)]
struct WireRequest {
    model: String,
    messages: Vec<WireMessage>,
    response_format: ResponseFormat,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder_works() {
        let config = OpenAiConfig::new("test-key")
            .with_model("gpt-4o")
            .with_base_url("https://custom.api.com")
            .with_timeout(Duration::from_secs(10));

        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.base_url, "https://custom.api.com");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.api_key(), "test-key");
    }

    #[test]
    fn wire_request_includes_system_prompt_first() {
        let responder = OpenAiResponder::new(OpenAiConfig::new("k")).unwrap();
        let messages = [ChatMessage::user("I'm stressed")];
        let request = responder.to_wire_request(&messages, None);

        assert_eq!(request.messages[0].role, "system");
        assert!(request.messages[0].content.contains("psychological first aid"));
        assert_eq!(request.messages[1].role, "user");
        assert_eq!(request.max_tokens, 1000);
    }

    #[test]
    fn personality_prompt_is_appended() {
        let responder = OpenAiResponder::new(OpenAiConfig::new("k")).unwrap();
        let personality = PersonalityConfig::new("Speak like a friendly senior", "Asha");
        let request = responder.to_wire_request(&[], Some(&personality));

        assert!(request.messages[0]
            .content
            .contains("Additional personality instructions: Speak like a friendly senior"));
    }

    #[test]
    fn well_formed_content_parses_fully() {
        let content = r#"{
            "message": "You're not alone in this",
            "supportiveActions": ["Breathe slowly", "Call a friend"],
            "riskLevel": "moderate",
            "escalationRequired": false
        }"#;
        let reply = OpenAiResponder::reply_from_content(content);

        assert_eq!(reply.message, "You're not alone in this");
        assert_eq!(reply.supportive_actions.len(), 2);
        assert_eq!(reply.risk_level, RiskLevel::Moderate);
        assert!(!reply.escalation_required);
    }

    #[test]
    fn malformed_content_degrades_to_defaults() {
        let reply = OpenAiResponder::reply_from_content("not json at all");

        assert!(reply.message.contains("tell me more"));
        assert_eq!(reply.supportive_actions.len(), 3);
        assert_eq!(reply.risk_level, RiskLevel::Low);
        assert!(!reply.escalation_required);
    }

    #[test]
    fn partially_formed_content_keeps_what_it_can() {
        let content = r#"{"message": "Hang in there", "riskLevel": "bogus"}"#;
        let reply = OpenAiResponder::reply_from_content(content);

        assert_eq!(reply.message, "Hang in there");
        assert_eq!(reply.risk_level, RiskLevel::Low);
        assert_eq!(reply.supportive_actions.len(), 3);
    }

    #[test]
    fn empty_actions_array_gets_defaults() {
        let content = r#"{"message": "ok", "supportiveActions": []}"#;
        let reply = OpenAiResponder::reply_from_content(content);
        assert_eq!(reply.supportive_actions.len(), 3);
    }
}
