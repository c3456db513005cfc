//! Health and circuit tracking for registered responders.
//!
//! One record per remote responder, created at orchestrator construction and
//! kept for the process lifetime. The circuit breaker decides candidate
//! eligibility; the availability probe only feeds diagnostics.
//!
//! ## States
//!
//! - **Closed**: normal operation, the responder is a candidate
//! - **Open**: too many consecutive failures, not a candidate
//! - **Half-Open**: Open but the recovery window has elapsed, so the
//!   responder is tentatively a candidate again pending one trial result
//!
//! ## Transitions
//!
//! ```text
//! Closed --[failure_threshold consecutive failures]--> Open
//! Open --[recovery window elapsed]--> Half-Open (implicit, time-derived)
//! Half-Open / Open --[any success]--> Closed
//! ```
//!
//! Counters are guarded by a per-responder mutex. Concurrent requests may
//! interleave updates; approximate counting is fine, open/closed transitions
//! only need to be eventually consistent.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Circuit breaker tuning, sourced from `OrchestratorConfig`.
#[derive(Debug, Clone)]
pub struct CircuitSettings {
    /// Consecutive failures before the circuit opens.
    pub failure_threshold: u32,
    /// Cooldown before an open circuit allows a trial call.
    pub recovery_window: Duration,
}

impl Default for CircuitSettings {
    fn default() -> Self {
        Self {
            failure_threshold: 2,
            recovery_window: Duration::from_secs(30),
        }
    }
}

/// Derived circuit state at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Normal operation.
    Closed,
    /// Cooling down after repeated failures.
    Open,
    /// Cooldown elapsed; eligible for a trial call.
    HalfOpen,
}

impl CircuitState {
    /// Whether a responder in this state is a usable candidate.
    pub fn is_candidate(&self) -> bool {
        matches!(self, CircuitState::Closed | CircuitState::HalfOpen)
    }
}

/// Mutable per-responder record.
#[derive(Debug)]
struct ProviderHealth {
    is_open: bool,
    consecutive_failures: u32,
    consecutive_successes: u32,
    last_failure: Option<Instant>,
    available: bool,
    last_check: Option<DateTime<Utc>>,
    last_latency: Duration,
}

impl ProviderHealth {
    fn new() -> Self {
        Self {
            is_open: false,
            consecutive_failures: 0,
            consecutive_successes: 0,
            last_failure: None,
            available: true,
            last_check: None,
            last_latency: Duration::ZERO,
        }
    }

    fn state(&self, now: Instant, recovery_window: Duration) -> CircuitState {
        if !self.is_open {
            return CircuitState::Closed;
        }
        match self.last_failure {
            Some(failed_at) if now.duration_since(failed_at) > recovery_window => {
                CircuitState::HalfOpen
            }
            _ => CircuitState::Open,
        }
    }
}

/// Diagnostic snapshot of a single responder, for observability surfaces.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponderStatus {
    /// Responder name.
    pub name: String,
    /// Result of the most recent availability probe.
    pub is_available: bool,
    /// Most recently observed call latency.
    pub latency_ms: u64,
    /// Whether the circuit is currently open.
    pub circuit_open: bool,
    /// Consecutive failure count.
    pub failure_count: u32,
    /// Consecutive success count.
    pub success_count: u32,
    /// Wall-clock time of the last availability probe, if any.
    pub last_check: Option<DateTime<Utc>>,
}

/// Tracks health and circuit state for a fixed set of responders.
///
/// Registration order is preserved and defines candidate preference order.
pub struct HealthTracker {
    settings: CircuitSettings,
    entries: Vec<(String, Mutex<ProviderHealth>)>,
    last_refresh: Mutex<Option<Instant>>,
}

impl HealthTracker {
    /// Creates a tracker for the given responder names, in preference order.
    pub fn new(settings: CircuitSettings, names: impl IntoIterator<Item = String>) -> Self {
        Self {
            settings,
            entries: names
                .into_iter()
                .map(|name| (name, Mutex::new(ProviderHealth::new())))
                .collect(),
            last_refresh: Mutex::new(None),
        }
    }

    fn entry(&self, name: &str) -> Option<&Mutex<ProviderHealth>> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, health)| health)
    }

    /// Records a successful call: failures reset, successes increment, an
    /// open circuit closes.
    pub fn record_success(&self, name: &str, latency: Duration) {
        let Some(entry) = self.entry(name) else { return };
        let mut health = entry.lock().expect("health lock poisoned");

        health.consecutive_failures = 0;
        health.consecutive_successes += 1;
        health.last_latency = latency;
        if health.is_open {
            tracing::info!("circuit closed for {} after successful request", name);
            health.is_open = false;
        }
    }

    /// Records a failed call: failures increment, successes reset, the
    /// circuit opens at the threshold.
    pub fn record_failure(&self, name: &str) {
        let Some(entry) = self.entry(name) else { return };
        let mut health = entry.lock().expect("health lock poisoned");

        health.consecutive_failures += 1;
        health.consecutive_successes = 0;
        health.last_failure = Some(Instant::now());

        if health.consecutive_failures >= self.settings.failure_threshold && !health.is_open {
            tracing::warn!(
                "circuit opened for {} after {} consecutive failures",
                name,
                health.consecutive_failures
            );
            health.is_open = true;
        }
    }

    /// Current circuit state for a responder.
    pub fn circuit_state(&self, name: &str) -> CircuitState {
        self.entry(name)
            .map(|entry| {
                entry
                    .lock()
                    .expect("health lock poisoned")
                    .state(Instant::now(), self.settings.recovery_window)
            })
            .unwrap_or(CircuitState::Closed)
    }

    /// Names of responders currently eligible as candidates, in
    /// registration order.
    pub fn candidates(&self) -> Vec<String> {
        let now = Instant::now();
        self.entries
            .iter()
            .filter(|(_, entry)| {
                entry
                    .lock()
                    .expect("health lock poisoned")
                    .state(now, self.settings.recovery_window)
                    .is_candidate()
            })
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// True if any registered responder is currently a candidate.
    pub fn any_candidate(&self) -> bool {
        !self.candidates().is_empty()
    }

    /// Records the result of an availability probe. Diagnostics only; never
    /// affects circuit state.
    pub fn note_probe(&self, name: &str, available: bool, latency: Duration) {
        let Some(entry) = self.entry(name) else { return };
        let mut health = entry.lock().expect("health lock poisoned");
        health.available = available;
        health.last_check = Some(Utc::now());
        if available {
            health.last_latency = latency;
        }
    }

    /// Claims the refresh slot if `interval` has elapsed since the last
    /// claim. Process-wide throttle; a doubled probe under a race is a
    /// tolerable inefficiency.
    pub fn claim_refresh(&self, interval: Duration) -> bool {
        let mut last = self.last_refresh.lock().expect("refresh lock poisoned");
        let now = Instant::now();
        match *last {
            Some(previous) if now.duration_since(previous) < interval => false,
            _ => {
                *last = Some(now);
                true
            }
        }
    }

    /// Diagnostic snapshot of one responder.
    pub fn snapshot(&self, name: &str) -> Option<ResponderStatus> {
        let entry = self.entry(name)?;
        let health = entry.lock().expect("health lock poisoned");
        Some(ResponderStatus {
            name: name.to_string(),
            is_available: health.available,
            latency_ms: health.last_latency.as_millis() as u64,
            circuit_open: health.is_open,
            failure_count: health.consecutive_failures,
            success_count: health.consecutive_successes,
            last_check: health.last_check,
        })
    }

    /// Registered responder names in preference order.
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(n, _)| n.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker(threshold: u32, window: Duration) -> HealthTracker {
        HealthTracker::new(
            CircuitSettings {
                failure_threshold: threshold,
                recovery_window: window,
            },
            vec!["a".to_string(), "b".to_string()],
        )
    }

    #[test]
    fn circuit_opens_at_threshold() {
        let tracker = tracker(2, Duration::from_secs(30));

        tracker.record_failure("a");
        assert_eq!(tracker.circuit_state("a"), CircuitState::Closed);

        tracker.record_failure("a");
        assert_eq!(tracker.circuit_state("a"), CircuitState::Open);
        assert_eq!(tracker.candidates(), vec!["b".to_string()]);
    }

    #[test]
    fn success_resets_failures_and_closes_circuit() {
        let tracker = tracker(2, Duration::from_secs(30));

        tracker.record_failure("a");
        tracker.record_failure("a");
        assert_eq!(tracker.circuit_state("a"), CircuitState::Open);

        tracker.record_success("a", Duration::from_millis(120));
        assert_eq!(tracker.circuit_state("a"), CircuitState::Closed);

        let status = tracker.snapshot("a").unwrap();
        assert_eq!(status.failure_count, 0);
        assert!(!status.circuit_open);
        assert_eq!(status.latency_ms, 120);
    }

    #[test]
    fn success_and_failure_counters_track_consecutive_runs() {
        let tracker = tracker(2, Duration::from_secs(30));

        tracker.record_success("a", Duration::from_millis(10));
        tracker.record_success("a", Duration::from_millis(10));
        assert_eq!(tracker.snapshot("a").unwrap().success_count, 2);

        tracker.record_failure("a");
        let status = tracker.snapshot("a").unwrap();
        assert_eq!(status.success_count, 0);
        assert_eq!(status.failure_count, 1);

        tracker.record_success("a", Duration::from_millis(10));
        let status = tracker.snapshot("a").unwrap();
        assert_eq!(status.success_count, 1);
        assert_eq!(status.failure_count, 0);
    }

    #[test]
    fn open_circuit_becomes_half_open_after_window() {
        let tracker = tracker(1, Duration::from_millis(20));

        tracker.record_failure("a");
        assert_eq!(tracker.circuit_state("a"), CircuitState::Open);
        assert!(!tracker.candidates().contains(&"a".to_string()));

        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(tracker.circuit_state("a"), CircuitState::HalfOpen);
        assert!(tracker.candidates().contains(&"a".to_string()));
    }

    #[test]
    fn half_open_failure_restarts_the_cooldown() {
        let tracker = tracker(1, Duration::from_millis(20));

        tracker.record_failure("a");
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(tracker.circuit_state("a"), CircuitState::HalfOpen);

        tracker.record_failure("a");
        assert_eq!(tracker.circuit_state("a"), CircuitState::Open);
    }

    #[test]
    fn candidates_preserve_registration_order() {
        let tracker = tracker(2, Duration::from_secs(30));
        assert_eq!(tracker.candidates(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn probe_results_do_not_gate_candidacy() {
        let tracker = tracker(2, Duration::from_secs(30));

        tracker.note_probe("a", false, Duration::ZERO);
        assert!(tracker.candidates().contains(&"a".to_string()));

        let status = tracker.snapshot("a").unwrap();
        assert!(!status.is_available);
        assert!(status.last_check.is_some());
    }

    #[test]
    fn refresh_claim_is_throttled() {
        let tracker = tracker(2, Duration::from_secs(30));

        assert!(tracker.claim_refresh(Duration::from_secs(60)));
        assert!(!tracker.claim_refresh(Duration::from_secs(60)));

        assert!(tracker.claim_refresh(Duration::ZERO));
    }

    #[test]
    fn unknown_name_is_ignored() {
        let tracker = tracker(2, Duration::from_secs(30));
        tracker.record_failure("missing");
        assert!(tracker.snapshot("missing").is_none());
        assert_eq!(tracker.circuit_state("missing"), CircuitState::Closed);
    }
}
