//! Orchestrator tuning configuration.

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Timeouts, circuit-breaker thresholds, and mode flags for the orchestrator.
#[derive(Debug, Clone, Deserialize)]
pub struct OrchestratorConfig {
    /// Per-call timeout for remote responders, in milliseconds.
    #[serde(default = "default_external_timeout_ms")]
    pub external_timeout_ms: u64,

    /// Per-call timeout for the local responder, in milliseconds.
    #[serde(default = "default_local_timeout_ms")]
    pub local_timeout_ms: u64,

    /// Consecutive failures before a responder's circuit opens.
    #[serde(default = "default_failure_threshold")]
    pub circuit_failure_threshold: u32,

    /// Cooldown before an open circuit allows a trial call, in milliseconds.
    #[serde(default = "default_recovery_window_ms")]
    pub circuit_recovery_window_ms: u64,

    /// Minimum interval between availability-probe sweeps, in milliseconds.
    #[serde(default = "default_health_check_interval_ms")]
    pub health_check_interval_ms: u64,

    /// Per-probe timeout during a health sweep, in milliseconds.
    #[serde(default = "default_health_check_timeout_ms")]
    pub health_check_timeout_ms: u64,

    /// When true, remote responders are never invoked.
    #[serde(default)]
    pub force_offline_mode: bool,

    /// When false, exhausting all remotes is a hard error instead of
    /// falling back to the local responder.
    #[serde(default = "default_enable_fallback")]
    pub enable_fallback: bool,
}

impl OrchestratorConfig {
    /// Remote call budget as a Duration.
    pub fn external_timeout(&self) -> Duration {
        Duration::from_millis(self.external_timeout_ms)
    }

    /// Local call budget as a Duration.
    pub fn local_timeout(&self) -> Duration {
        Duration::from_millis(self.local_timeout_ms)
    }

    /// Circuit cooldown as a Duration.
    pub fn recovery_window(&self) -> Duration {
        Duration::from_millis(self.circuit_recovery_window_ms)
    }

    /// Health sweep throttle as a Duration.
    pub fn health_check_interval(&self) -> Duration {
        Duration::from_millis(self.health_check_interval_ms)
    }

    /// Per-probe budget as a Duration.
    pub fn health_check_timeout(&self) -> Duration {
        Duration::from_millis(self.health_check_timeout_ms)
    }

    /// Validate orchestrator configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.external_timeout_ms == 0 || self.local_timeout_ms == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        if self.circuit_failure_threshold == 0 {
            return Err(ValidationError::InvalidFailureThreshold);
        }
        Ok(())
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            external_timeout_ms: default_external_timeout_ms(),
            local_timeout_ms: default_local_timeout_ms(),
            circuit_failure_threshold: default_failure_threshold(),
            circuit_recovery_window_ms: default_recovery_window_ms(),
            health_check_interval_ms: default_health_check_interval_ms(),
            health_check_timeout_ms: default_health_check_timeout_ms(),
            force_offline_mode: false,
            enable_fallback: default_enable_fallback(),
        }
    }
}

fn default_external_timeout_ms() -> u64 {
    8000
}

fn default_local_timeout_ms() -> u64 {
    2000
}

fn default_failure_threshold() -> u32 {
    2
}

fn default_recovery_window_ms() -> u64 {
    30_000
}

fn default_health_check_interval_ms() -> u64 {
    30_000
}

fn default_health_check_timeout_ms() -> u64 {
    5000
}

fn default_enable_fallback() -> bool {
    true
}
