//! Sidecar Responder - adapter for the healthcare-search sidecar service.
//!
//! The sidecar is a local HTTP service that answers health-related questions
//! with real-time search results. It exposes `GET /health` for liveness and
//! `POST /chat` for generation. Replies carry the sources the answer was
//! built from; those are appended to the message as a formatted list.
//!
//! The sidecar declines questions outside its healthcare focus
//! (`is_healthcare_related: false`); this adapter reports that as an error so
//! the orchestrator falls through to the next candidate, which is the
//! behavior we want for general conversation.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::{exercises, risk};
use crate::ports::{
    ChatMessage, CrisisAnalysis, CrisisSupport, PersonalityConfig, Responder, ResponderError,
    RiskLevel, SupportReply,
};

/// How many trailing messages are forwarded as context.
const HISTORY_WINDOW: usize = 5;

/// How many sources are cited in the reply.
const MAX_SOURCES: usize = 3;

/// Configuration for the sidecar responder.
#[derive(Debug, Clone)]
pub struct SidecarConfig {
    /// Base URL of the sidecar service.
    pub base_url: String,
    /// Transport-level request timeout.
    pub timeout: Duration,
    /// Timeout for the liveness probe.
    pub probe_timeout: Duration,
}

impl SidecarConfig {
    /// Creates a configuration pointing at the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(15),
            probe_timeout: Duration::from_secs(5),
        }
    }

    /// Sets the transport timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for SidecarConfig {
    fn default() -> Self {
        Self::new("http://127.0.0.1:5001")
    }
}

/// Healthcare-search sidecar responder.
pub struct SidecarResponder {
    config: SidecarConfig,
    client: Client,
}

impl SidecarResponder {
    /// Creates a new responder with the given configuration.
    pub fn new(config: SidecarConfig) -> Result<Self, ResponderError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| ResponderError::Internal(format!("failed to build HTTP client: {err}")))?;

        Ok(Self { config, client })
    }

    fn chat_url(&self) -> String {
        format!("{}/chat", self.config.base_url)
    }

    fn health_url(&self) -> String {
        format!("{}/health", self.config.base_url)
    }

    fn map_transport_error(&self, e: reqwest::Error) -> ResponderError {
        if e.is_timeout() {
            ResponderError::timeout("sidecar", self.config.timeout.as_millis() as u64)
        } else if e.is_connect() {
            ResponderError::network(format!("Connection failed: {}", e))
        } else {
            ResponderError::network(e.to_string())
        }
    }

    /// Appends cited sources to the reply text.
    fn format_with_sources(message: &str, sources: &[ChatSource]) -> String {
        if sources.is_empty() {
            return message.to_string();
        }

        let mut formatted = format!("{message}\n\nReal-time search sources:");
        for (i, source) in sources.iter().take(MAX_SOURCES).enumerate() {
            formatted.push_str(&format!(
                "\n{}. [{}]({}) - {}",
                i + 1,
                source.title,
                source.url,
                source.domain
            ));
        }
        formatted
    }

    fn actions_for(risk_level: RiskLevel) -> Vec<String> {
        match risk_level {
            RiskLevel::High => vec![
                "Contact emergency services or a crisis helpline now".to_string(),
                "Stay with someone you trust".to_string(),
                "Reach out to campus counseling immediately".to_string(),
            ],
            _ => vec![
                "Consult with a healthcare provider".to_string(),
                "Visit trusted medical websites".to_string(),
                "Contact your doctor if symptoms persist".to_string(),
            ],
        }
    }
}

#[async_trait]
impl Responder for SidecarResponder {
    async fn generate_response(
        &self,
        messages: &[ChatMessage],
        personality: Option<&PersonalityConfig>,
    ) -> Result<SupportReply, ResponderError> {
        let user_message = messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();

        let history_start = messages.len().saturating_sub(HISTORY_WINDOW);
        let request = ChatRequest {
            message: user_message.clone(),
            chat_history: messages[history_start..].to_vec(),
            personality: personality.cloned(),
        };

        let response = self
            .client
            .post(self.chat_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ResponderError::unavailable(format!(
                "sidecar error {}: {}",
                status, body
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| ResponderError::unavailable(format!("sidecar payload error: {}", e)))?;

        if !body.success {
            return Err(ResponderError::unavailable(
                body.error
                    .unwrap_or_else(|| "sidecar returned unsuccessful response".to_string()),
            ));
        }

        if !body.is_healthcare_related {
            // Not this backend's domain; let the orchestrator move on.
            return Err(ResponderError::unavailable("query not healthcare related"));
        }

        let risk_level = risk::assess_risk(&user_message);

        Ok(SupportReply {
            message: Self::format_with_sources(&body.message, &body.sources),
            supportive_actions: Self::actions_for(risk_level),
            risk_level,
            escalation_required: risk_level == RiskLevel::High,
        })
    }

    async fn is_available(&self) -> bool {
        let result = self
            .client
            .get(self.health_url())
            .timeout(self.config.probe_timeout)
            .send()
            .await;

        match result {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    fn name(&self) -> &str {
        "sidecar"
    }

    fn crisis_support(&self) -> Option<&dyn CrisisSupport> {
        Some(self)
    }
}

#[async_trait]
impl CrisisSupport for SidecarResponder {
    async fn analyze_for_crisis(&self, message: &str) -> Result<CrisisAnalysis, ResponderError> {
        // The sidecar focuses on healthcare search; crisis detection stays
        // on the deterministic keyword engine.
        Ok(risk::analyze(message))
    }

    async fn guided_exercise(&self, kind: &str) -> Result<Vec<String>, ResponderError> {
        Ok(exercises::steps_for(kind))
    }
}

// ----- Wire types -----

#[derive(Debug, Serialize)]
struct ChatRequest {
    message: String,
    chat_history: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    personality: Option<PersonalityConfig>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    success: bool,
    #[serde(default)]
    message: String,
    #[serde(default)]
    sources: Vec<ChatSource>,
    #[serde(default)]
    is_healthcare_related: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatSource {
    title: String,
    url: String,
    domain: String,
}
