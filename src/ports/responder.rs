//! Responder Port - Interface for AI backend integrations.
//!
//! This port abstracts all interactions with AI backends (remote APIs, the
//! local rule-based engine), enabling the orchestrator to generate supportive
//! replies without coupling to a specific backend.
//!
//! # Design
//!
//! - Provider-agnostic message format
//! - Required operations: generate a reply, report availability, report a name
//! - Optional capabilities (crisis analysis, guided exercises) live on a
//!   separate [`CrisisSupport`] trait discovered via
//!   [`Responder::crisis_support`]
//! - Error types for true unavailability only; malformed upstream payloads
//!   must be absorbed by adapters, not surfaced as errors

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Port for AI responder backends.
///
/// Implementations connect to external AI services or the local fallback
/// engine and translate between the backend-specific API and our domain types.
#[async_trait]
pub trait Responder: Send + Sync {
    /// Generate a supportive reply for the given conversation.
    ///
    /// Fails only on true unavailability (timeout, transport error, auth).
    /// A backend that answers with a malformed payload must synthesize a
    /// best-effort default reply instead of failing, so that errors are
    /// reserved for conditions worth tripping the circuit breaker.
    async fn generate_response(
        &self,
        messages: &[ChatMessage],
        personality: Option<&PersonalityConfig>,
    ) -> Result<SupportReply, ResponderError>;

    /// Cheap, side-effect-free liveness probe.
    ///
    /// Callers must bound this with their own timeout; implementations are
    /// not assumed to answer quickly.
    async fn is_available(&self) -> bool;

    /// Identifying string for logs and diagnostics.
    fn name(&self) -> &str;

    /// Optional crisis-support capability.
    ///
    /// Returns `None` when the backend offers neither crisis analysis nor
    /// guided exercises; the orchestrator skips it for those operations.
    fn crisis_support(&self) -> Option<&dyn CrisisSupport> {
        None
    }
}

/// Optional capability: crisis analysis and guided exercises.
#[async_trait]
pub trait CrisisSupport: Send + Sync {
    /// Analyze a message for crisis indicators and risk assessment.
    async fn analyze_for_crisis(&self, message: &str) -> Result<CrisisAnalysis, ResponderError>;

    /// Generate step-by-step guided exercise instructions.
    ///
    /// Unknown exercise kinds fall back to a default sequence rather than
    /// failing.
    async fn guided_exercise(&self, kind: &str) -> Result<Vec<String>, ResponderError>;
}

/// A message in the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who sent this message.
    pub role: MessageRole,
    /// Message content.
    pub content: String,
    /// When the message was sent, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl ChatMessage {
    /// Creates a new message without a timestamp.
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: None,
        }
    }

    /// Creates a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Creates an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

/// Role of the message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instructions (guides model behavior).
    System,
    /// User input.
    User,
    /// Assistant (model) response.
    Assistant,
}

/// Optional personality configuration, passed through to whichever
/// responder handles the request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersonalityConfig {
    /// Custom prompt text injected into the backend's system prompt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_prompt: Option<String>,
    /// Display name used to personalize canned replies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Free-form personality traits.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traits: Option<HashMap<String, serde_json::Value>>,
}

impl PersonalityConfig {
    /// Creates a personality with a custom prompt and name.
    pub fn new(custom_prompt: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            custom_prompt: Some(custom_prompt.into()),
            name: Some(name.into()),
            traits: None,
        }
    }
}

/// Structured supportive reply - the only value type returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportReply {
    /// The supportive response text.
    pub message: String,
    /// 2-4 short, concrete actions the user can take.
    pub supportive_actions: Vec<String>,
    /// Assessed risk level for this exchange.
    pub risk_level: RiskLevel,
    /// Whether immediate professional help is needed.
    ///
    /// Expected (but not enforced) to correlate with `risk_level == High`;
    /// backends set both independently.
    pub escalation_required: bool,
}

/// Risk severity scale shared by replies and crisis analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl Default for RiskLevel {
    fn default() -> Self {
        RiskLevel::Low
    }
}

/// Result of analyzing a message for crisis indicators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrisisAnalysis {
    /// Whether the message signals immediate danger.
    pub is_high_risk: bool,
    /// Assessed severity.
    pub severity: RiskLevel,
    /// Phrases or patterns that triggered the assessment.
    pub indicators: Vec<String>,
    /// Suggested next steps for the person supporting the user.
    pub recommended_actions: Vec<String>,
}

/// Responder errors - true unavailability only.
#[derive(Debug, thiserror::Error)]
pub enum ResponderError {
    /// Call exceeded its time budget.
    #[error("{responder} timed out after {timeout_ms}ms")]
    Timeout {
        /// Responder that timed out.
        responder: String,
        /// Configured budget.
        timeout_ms: u64,
    },

    /// Network error during request (DNS, connect, transport).
    #[error("network error: {0}")]
    Network(String),

    /// Backend reachable but unable to serve (5xx, rate limit, declined query).
    #[error("responder unavailable: {message}")]
    Unavailable {
        /// Error details.
        message: String,
    },

    /// API key or authentication failed.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Backend rejected the request as malformed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Internal fault in the responder itself.
    #[error("internal responder error: {0}")]
    Internal(String),
}

impl ResponderError {
    /// Creates a timeout error.
    pub fn timeout(responder: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            responder: responder.into(),
            timeout_ms,
        }
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}
