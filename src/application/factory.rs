//! Orchestrator assembly from application configuration.
//!
//! Decides the operating mode (offline vs. hybrid) from which credentials
//! are actually present, wires up concrete responders, and returns a shared
//! orchestrator handle.

use std::sync::Arc;

use crate::adapters::ai::{LocalResponder, OpenAiConfig, OpenAiResponder, SidecarConfig, SidecarResponder};
use crate::application::orchestrator::Orchestrator;
use crate::config::AppConfig;

/// Hybrid-mode cap on the per-call remote budget. Keeps worst-case
/// first-token latency bounded even when config asks for more.
const HYBRID_EXTERNAL_TIMEOUT_CAP_MS: u64 = 10_000;

/// Errors raised while assembling the orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum FactoryError {
    /// A responder could not be constructed from its configuration.
    #[error("failed to construct {responder} responder: {message}")]
    ResponderConstruction { responder: String, message: String },
}

/// Builds a fully wired orchestrator from configuration.
///
/// When no remote backend is configured (no OpenAI key, no sidecar URL),
/// the orchestrator is forced into offline mode regardless of the
/// `force_offline_mode` flag, because there is nothing to dispatch to.
pub fn build_orchestrator(config: &AppConfig) -> Result<Arc<Orchestrator>, FactoryError> {
    let mut orchestrator_config = config.orchestrator.clone();

    if !config.ai.has_remote() && !orchestrator_config.force_offline_mode {
        tracing::info!("no remote AI backend configured, forcing offline mode");
        orchestrator_config.force_offline_mode = true;
    }

    if !orchestrator_config.force_offline_mode {
        orchestrator_config.external_timeout_ms = orchestrator_config
            .external_timeout_ms
            .min(HYBRID_EXTERNAL_TIMEOUT_CAP_MS);
    }

    let mut builder =
        Orchestrator::builder(orchestrator_config.clone()).with_local(Arc::new(LocalResponder::new()));

    if !orchestrator_config.force_offline_mode {
        if let Some(api_key) = config.ai.openai_api_key.as_deref().filter(|k| !k.is_empty()) {
            let mut openai_config =
                OpenAiConfig::new(api_key).with_timeout(orchestrator_config.external_timeout());
            if let Some(base_url) = &config.ai.openai_base_url {
                openai_config = openai_config.with_base_url(base_url.clone());
            }
            if let Some(model) = &config.ai.openai_model {
                openai_config = openai_config.with_model(model.clone());
            }

            let responder = OpenAiResponder::new(openai_config).map_err(|err| {
                FactoryError::ResponderConstruction {
                    responder: "openai".to_string(),
                    message: err.to_string(),
                }
            })?;
            builder = builder.register("openai", Arc::new(responder));
        }

        if let Some(base_url) = config.ai.sidecar_base_url.as_deref().filter(|u| !u.is_empty()) {
            let sidecar_config = SidecarConfig::new(base_url)
                .with_timeout(orchestrator_config.external_timeout());

            let responder = SidecarResponder::new(sidecar_config).map_err(|err| {
                FactoryError::ResponderConstruction {
                    responder: "sidecar".to_string(),
                    message: err.to_string(),
                }
            })?;
            builder = builder.register("sidecar", Arc::new(responder));
        }
    }

    let orchestrator = Arc::new(builder.build());
    if orchestrator_config.force_offline_mode {
        tracing::info!("AI orchestrator running in offline mode");
    } else {
        tracing::info!(
            openai = config.ai.has_openai(),
            sidecar = config.ai.has_sidecar(),
            "AI orchestrator running in hybrid mode"
        );
    }

    Ok(orchestrator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AiConfig, OrchestratorConfig};

    fn base_config() -> AppConfig {
        AppConfig {
            orchestrator: OrchestratorConfig::default(),
            ai: AiConfig::default(),
        }
    }

    #[test]
    fn no_credentials_forces_offline() {
        let orchestrator = build_orchestrator(&base_config()).unwrap();
        assert_eq!(orchestrator.describe(), "orchestrator (offline: local)");
    }

    #[test]
    fn openai_key_enables_hybrid_mode() {
        let mut config = base_config();
        config.ai.openai_api_key = Some("sk-test".to_string());

        let orchestrator = build_orchestrator(&config).unwrap();
        assert_eq!(
            orchestrator.describe(),
            "orchestrator (primary: openai, fallback: local)"
        );
    }

    #[test]
    fn sidecar_registers_after_openai() {
        let mut config = base_config();
        config.ai.openai_api_key = Some("sk-test".to_string());
        config.ai.sidecar_base_url = Some("http://127.0.0.1:5001".to_string());

        let orchestrator = build_orchestrator(&config).unwrap();
        let report = orchestrator.provider_status();
        let names: Vec<&str> = report.remotes.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["openai", "sidecar"]);
    }

    #[test]
    fn forced_offline_ignores_credentials() {
        let mut config = base_config();
        config.orchestrator.force_offline_mode = true;
        config.ai.openai_api_key = Some("sk-test".to_string());

        let orchestrator = build_orchestrator(&config).unwrap();
        assert!(orchestrator.provider_status().remotes.is_empty());
        assert_eq!(orchestrator.describe(), "orchestrator (offline: local)");
    }
}
