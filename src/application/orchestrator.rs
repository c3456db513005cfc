//! Offline-first responder orchestration.
//!
//! The orchestrator routes each request through an ordered list of remote
//! responders, bounds every call with a timeout, advances circuit state on
//! each outcome, and guarantees a reply via the local responder - or, if
//! even that fails, a fixed emergency reply. With fallback enabled, callers
//! never see an error.
//!
//! Candidate order is the registration order, fixed at construction; the
//! orchestrator never reorders based on observed latency, which keeps
//! behavior deterministic and testable.

use std::sync::Arc;
use std::time::Instant;
use tokio::time::timeout;
use uuid::Uuid;

use crate::application::health::{CircuitSettings, HealthTracker, ResponderStatus};
use crate::config::OrchestratorConfig;
use crate::domain::{exercises, risk};
use crate::ports::{
    ChatMessage, CrisisAnalysis, PersonalityConfig, Responder, RiskLevel, SupportReply,
};

/// Emergency reply used when every backend, including the local responder,
/// has failed. Pure local computation; this path cannot block or fail.
const EMERGENCY_MESSAGE: &str =
    "I'm having trouble connecting to my AI services right now, but I'm here to listen. \
     Please know that you're not alone, and if this is urgent, don't hesitate to reach out \
     to a counselor or crisis helpline immediately.";

const EMERGENCY_ACTIONS: [&str; 4] = [
    "Take deep breaths to stay calm",
    "Reach out to a trusted friend or family member",
    "Contact your campus counseling center",
    "Call a crisis helpline if you're in immediate distress",
];

/// Orchestrator errors. Only reachable with fallback disabled.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    /// Every remote candidate failed and fallback is disabled.
    #[error("all AI providers are unavailable and fallback is disabled")]
    AllProvidersUnavailable,
}

/// Offline-first AI responder orchestrator.
///
/// Owns exactly one local responder (always present) and zero or more
/// remote responders, each paired with a circuit record in the
/// [`HealthTracker`]. Share it via `Arc`; per-request state is all local.
pub struct Orchestrator {
    config: OrchestratorConfig,
    local: Arc<dyn Responder>,
    remotes: Vec<(String, Arc<dyn Responder>)>,
    tracker: HealthTracker,
}

/// Builder assembling an orchestrator with an explicit responder list.
///
/// Registration order defines candidate preference order.
pub struct OrchestratorBuilder {
    config: OrchestratorConfig,
    local: Arc<dyn Responder>,
    remotes: Vec<(String, Arc<dyn Responder>)>,
}

impl OrchestratorBuilder {
    /// Replaces the local fallback responder.
    pub fn with_local(mut self, local: Arc<dyn Responder>) -> Self {
        self.local = local;
        self
    }

    /// Registers a remote responder under the given name.
    pub fn register(mut self, name: impl Into<String>, responder: Arc<dyn Responder>) -> Self {
        self.remotes.push((name.into(), responder));
        self
    }

    /// Builds the orchestrator.
    pub fn build(self) -> Orchestrator {
        let settings = CircuitSettings {
            failure_threshold: self.config.circuit_failure_threshold,
            recovery_window: self.config.recovery_window(),
        };
        let tracker = HealthTracker::new(settings, self.remotes.iter().map(|(n, _)| n.clone()));

        Orchestrator {
            config: self.config,
            local: self.local,
            remotes: self.remotes,
            tracker,
        }
    }
}

impl Orchestrator {
    /// Starts building an orchestrator with the default local responder.
    pub fn builder(config: OrchestratorConfig) -> OrchestratorBuilder {
        OrchestratorBuilder {
            config,
            local: Arc::new(crate::adapters::ai::LocalResponder::new()),
            remotes: Vec::new(),
        }
    }

    fn remote(&self, name: &str) -> Option<&Arc<dyn Responder>> {
        self.remotes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, r)| r)
    }

    /// Generate a supportive reply with candidate fallthrough.
    ///
    /// With fallback enabled this never fails: remote failures fall through
    /// to the local responder, and a local failure degrades to the fixed
    /// emergency reply.
    pub async fn generate_response(
        &self,
        messages: &[ChatMessage],
        personality: Option<&PersonalityConfig>,
    ) -> Result<SupportReply, OrchestratorError> {
        let request_id = Uuid::new_v4();

        if self.config.force_offline_mode {
            tracing::debug!(%request_id, "offline mode forced, using local responder");
            return Ok(self.local_or_emergency(messages, personality).await);
        }

        self.refresh_health().await;

        for name in self.tracker.candidates() {
            let Some(responder) = self.remote(&name) else {
                continue;
            };

            tracing::debug!(%request_id, responder = %name, "attempting response generation");
            let started = Instant::now();
            let outcome = timeout(
                self.config.external_timeout(),
                responder.generate_response(messages, personality),
            )
            .await;

            match outcome {
                Ok(Ok(reply)) => {
                    self.tracker.record_success(&name, started.elapsed());
                    tracing::info!(%request_id, responder = %name, "response generated");
                    return Ok(reply);
                }
                Ok(Err(err)) => {
                    tracing::warn!(%request_id, responder = %name, "responder failed: {}", err);
                    self.tracker.record_failure(&name);
                }
                Err(_) => {
                    tracing::warn!(
                        %request_id,
                        responder = %name,
                        "responder timed out after {}ms",
                        self.config.external_timeout_ms
                    );
                    self.tracker.record_failure(&name);
                }
            }
        }

        if self.config.enable_fallback {
            tracing::info!(%request_id, "all remote responders failed, falling back to local");
            return Ok(self.local_or_emergency(messages, personality).await);
        }

        Err(OrchestratorError::AllProvidersUnavailable)
    }

    /// Analyze a message for crisis indicators.
    ///
    /// Tries every eligible remote with the capability first; if none
    /// succeed, the local keyword analysis runs unconditionally. Crisis
    /// detection is never skipped, so this is infallible.
    pub async fn analyze_for_crisis(&self, message: &str) -> CrisisAnalysis {
        if !self.config.force_offline_mode {
            for name in self.tracker.candidates() {
                let Some(responder) = self.remote(&name) else {
                    continue;
                };
                let Some(support) = responder.crisis_support() else {
                    continue;
                };

                let started = Instant::now();
                match timeout(
                    self.config.external_timeout(),
                    support.analyze_for_crisis(message),
                )
                .await
                {
                    Ok(Ok(analysis)) => {
                        self.tracker.record_success(&name, started.elapsed());
                        return analysis;
                    }
                    Ok(Err(err)) => {
                        tracing::warn!(responder = %name, "crisis analysis failed: {}", err);
                        self.tracker.record_failure(&name);
                    }
                    Err(_) => {
                        tracing::warn!(responder = %name, "crisis analysis timed out");
                        self.tracker.record_failure(&name);
                    }
                }
            }
        }

        tracing::debug!("using local crisis analysis");
        if let Some(support) = self.local.crisis_support() {
            if let Ok(Ok(analysis)) = timeout(
                self.config.local_timeout(),
                support.analyze_for_crisis(message),
            )
            .await
            {
                return analysis;
            }
        }

        // Terminal backstop: the pure keyword engine.
        risk::analyze(message)
    }

    /// Generate step-by-step guided exercise instructions.
    ///
    /// Same candidate pattern as crisis analysis, with the exercise catalog
    /// as the terminal backstop. Unknown kinds yield the default sequence.
    pub async fn guided_exercise(&self, kind: &str) -> Vec<String> {
        if !self.config.force_offline_mode {
            for name in self.tracker.candidates() {
                let Some(responder) = self.remote(&name) else {
                    continue;
                };
                let Some(support) = responder.crisis_support() else {
                    continue;
                };

                let started = Instant::now();
                match timeout(self.config.external_timeout(), support.guided_exercise(kind)).await
                {
                    Ok(Ok(steps)) if !steps.is_empty() => {
                        self.tracker.record_success(&name, started.elapsed());
                        return steps;
                    }
                    Ok(Ok(_)) | Ok(Err(_)) => {
                        tracing::warn!(responder = %name, "guided exercise generation failed");
                        self.tracker.record_failure(&name);
                    }
                    Err(_) => {
                        tracing::warn!(responder = %name, "guided exercise generation timed out");
                        self.tracker.record_failure(&name);
                    }
                }
            }
        }

        tracing::debug!("using local guided exercise generation");
        if let Some(support) = self.local.crisis_support() {
            if let Ok(Ok(steps)) =
                timeout(self.config.local_timeout(), support.guided_exercise(kind)).await
            {
                if !steps.is_empty() {
                    return steps;
                }
            }
        }

        exercises::steps_for(kind)
    }

    /// True if the local responder or any eligible remote can serve.
    pub async fn is_available(&self) -> bool {
        let local_available = timeout(self.config.local_timeout(), self.local.is_available())
            .await
            .unwrap_or(false);

        if self.config.force_offline_mode {
            return local_available;
        }

        local_available || self.tracker.any_candidate()
    }

    /// Human-readable description of the current routing posture.
    pub fn describe(&self) -> String {
        if self.config.force_offline_mode {
            return format!("orchestrator (offline: {})", self.local.name());
        }

        match self.tracker.candidates().first() {
            Some(primary) => format!(
                "orchestrator (primary: {}, fallback: {})",
                primary,
                self.local.name()
            ),
            None => format!("orchestrator (offline: {})", self.local.name()),
        }
    }

    /// Read-only diagnostic report for observability/admin surfaces.
    pub fn provider_status(&self) -> ProviderStatusReport {
        ProviderStatusReport {
            force_offline_mode: self.config.force_offline_mode,
            enable_fallback: self.config.enable_fallback,
            local: LocalStatus {
                name: self.local.name().to_string(),
                is_available: true,
            },
            remotes: self
                .tracker
                .names()
                .iter()
                .filter_map(|name| self.tracker.snapshot(name))
                .collect(),
        }
    }

    /// Probes every remote's availability if the refresh interval elapsed.
    ///
    /// Throttled process-wide; probe results feed diagnostics only and never
    /// gate candidate eligibility.
    async fn refresh_health(&self) {
        if self.remotes.is_empty() || !self.tracker.claim_refresh(self.config.health_check_interval())
        {
            return;
        }

        for (name, responder) in &self.remotes {
            let started = Instant::now();
            match timeout(self.config.health_check_timeout(), responder.is_available()).await {
                Ok(available) => {
                    self.tracker.note_probe(name, available, started.elapsed());
                }
                Err(_) => {
                    tracing::warn!(responder = %name, "health check timed out");
                    self.tracker.note_probe(name, false, started.elapsed());
                }
            }
        }
    }

    /// Local responder under its timeout, degrading to the emergency reply.
    async fn local_or_emergency(
        &self,
        messages: &[ChatMessage],
        personality: Option<&PersonalityConfig>,
    ) -> SupportReply {
        match timeout(
            self.config.local_timeout(),
            self.local.generate_response(messages, personality),
        )
        .await
        {
            Ok(Ok(reply)) => reply,
            Ok(Err(err)) => {
                tracing::error!("local responder failed: {}", err);
                Self::emergency_reply()
            }
            Err(_) => {
                tracing::error!(
                    "local responder exceeded {}ms budget",
                    self.config.local_timeout_ms
                );
                Self::emergency_reply()
            }
        }
    }

    fn emergency_reply() -> SupportReply {
        SupportReply {
            message: EMERGENCY_MESSAGE.to_string(),
            supportive_actions: EMERGENCY_ACTIONS.iter().map(|a| a.to_string()).collect(),
            risk_level: RiskLevel::Moderate,
            escalation_required: true,
        }
    }
}

/// Diagnostic report returned by [`Orchestrator::provider_status`].
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStatusReport {
    /// Whether remote responders are disabled entirely.
    pub force_offline_mode: bool,
    /// Whether the local fallback is enabled.
    pub enable_fallback: bool,
    /// The always-available local responder.
    pub local: LocalStatus,
    /// Per-remote diagnostics, in registration order.
    pub remotes: Vec<ResponderStatus>,
}

/// Status entry for the local responder.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalStatus {
    pub name: String,
    pub is_available: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::{LocalResponder, MockFailure, MockResponder};

    fn config() -> OrchestratorConfig {
        OrchestratorConfig {
            external_timeout_ms: 200,
            local_timeout_ms: 200,
            circuit_failure_threshold: 2,
            circuit_recovery_window_ms: 30_000,
            health_check_interval_ms: 30_000,
            health_check_timeout_ms: 100,
            force_offline_mode: false,
            enable_fallback: true,
        }
    }

    #[tokio::test]
    async fn no_remotes_means_local_reply() {
        let orchestrator = Orchestrator::builder(config()).build();
        let reply = orchestrator
            .generate_response(&[ChatMessage::user("hello")], None)
            .await
            .unwrap();

        assert!(!reply.message.is_empty());
        assert!(!reply.escalation_required);
    }

    #[tokio::test]
    async fn emergency_reply_when_local_fails_too() {
        let broken_local = MockResponder::named("broken-local").with_failure(MockFailure::Network {
            message: "local blew up".to_string(),
        });
        let orchestrator = Orchestrator::builder(config())
            .with_local(Arc::new(broken_local))
            .build();

        let reply = orchestrator.generate_response(&[], None).await.unwrap();

        assert_eq!(reply.message, EMERGENCY_MESSAGE);
        assert_eq!(reply.supportive_actions.len(), 4);
        assert_eq!(reply.risk_level, RiskLevel::Moderate);
        assert!(reply.escalation_required);
    }

    #[tokio::test]
    async fn fallback_disabled_surfaces_error() {
        let failing = MockResponder::named("remote").with_failure(MockFailure::Unavailable {
            message: "down".to_string(),
        });
        let orchestrator = Orchestrator::builder(OrchestratorConfig {
            enable_fallback: false,
            ..config()
        })
        .register("remote", Arc::new(failing))
        .build();

        let result = orchestrator.generate_response(&[], None).await;
        assert!(matches!(
            result,
            Err(OrchestratorError::AllProvidersUnavailable)
        ));
    }

    #[tokio::test]
    async fn describe_reports_primary_and_fallback() {
        let remote = MockResponder::named("primary-mock").with_reply("hi");
        let orchestrator = Orchestrator::builder(config())
            .with_local(Arc::new(LocalResponder::new()))
            .register("primary-mock", Arc::new(remote))
            .build();

        assert_eq!(
            orchestrator.describe(),
            "orchestrator (primary: primary-mock, fallback: local)"
        );
    }

    #[tokio::test]
    async fn describe_reports_offline_when_forced() {
        let orchestrator = Orchestrator::builder(OrchestratorConfig {
            force_offline_mode: true,
            ..config()
        })
        .build();

        assert_eq!(orchestrator.describe(), "orchestrator (offline: local)");
    }

    #[tokio::test]
    async fn provider_status_serializes() {
        let remote = MockResponder::named("r1").with_reply("hi");
        let orchestrator = Orchestrator::builder(config())
            .register("r1", Arc::new(remote))
            .build();

        let report = orchestrator.provider_status();
        assert_eq!(report.remotes.len(), 1);
        assert_eq!(report.remotes[0].name, "r1");

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"forceOfflineMode\":false"));
        assert!(json.contains("\"circuitOpen\":false"));
    }
}
