//! Mock Responder for testing.
//!
//! Configurable implementation of the Responder port, allowing orchestration
//! tests to run without real backends.
//!
//! # Features
//!
//! - Pre-configured replies (consumed in order, last one repeats)
//! - Simulated delays for timeout testing
//! - Error injection for resilience testing
//! - Call tracking for verification
//!
//! # Example
//!
//! ```ignore
//! let responder = MockResponder::named("primary")
//!     .with_reply("I'm listening")
//!     .with_delay(Duration::from_millis(100));
//!
//! let reply = responder.generate_response(&messages, None).await?;
//! assert_eq!(reply.message, "I'm listening");
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use crate::domain::{exercises, risk};
use crate::ports::{
    ChatMessage, CrisisAnalysis, CrisisSupport, PersonalityConfig, Responder, ResponderError,
    RiskLevel, SupportReply,
};

/// A configured mock outcome.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    /// Return a successful reply.
    Reply(SupportReply),
    /// Return an error.
    Error(MockFailure),
}

/// Mock failure kinds, mapped onto [`ResponderError`] when consumed.
#[derive(Debug, Clone)]
pub enum MockFailure {
    /// Simulate a timeout reported by the backend itself.
    Timeout { timeout_ms: u64 },
    /// Simulate a network error.
    Network { message: String },
    /// Simulate backend unavailability.
    Unavailable { message: String },
    /// Simulate an authentication failure.
    AuthenticationFailed,
}

impl MockFailure {
    fn into_error(self, responder: &str) -> ResponderError {
        match self {
            MockFailure::Timeout { timeout_ms } => ResponderError::timeout(responder, timeout_ms),
            MockFailure::Network { message } => ResponderError::network(message),
            MockFailure::Unavailable { message } => ResponderError::unavailable(message),
            MockFailure::AuthenticationFailed => ResponderError::AuthenticationFailed,
        }
    }
}

/// Configurable mock responder.
#[derive(Clone)]
pub struct MockResponder {
    name: String,
    /// Outcomes consumed in order; the final one repeats once the queue is
    /// exhausted.
    outcomes: Arc<Mutex<VecDeque<MockOutcome>>>,
    last_outcome: Arc<Mutex<Option<MockOutcome>>>,
    delay: Duration,
    available: Arc<AtomicBool>,
    has_crisis_support: bool,
    generate_calls: Arc<AtomicUsize>,
    probe_calls: Arc<AtomicUsize>,
}

impl MockResponder {
    /// Creates a mock with the given name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            outcomes: Arc::new(Mutex::new(VecDeque::new())),
            last_outcome: Arc::new(Mutex::new(None)),
            delay: Duration::ZERO,
            available: Arc::new(AtomicBool::new(true)),
            has_crisis_support: true,
            generate_calls: Arc::new(AtomicUsize::new(0)),
            probe_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Queues a successful reply with low risk and default actions.
    pub fn with_reply(self, message: impl Into<String>) -> Self {
        self.with_outcome(MockOutcome::Reply(SupportReply {
            message: message.into(),
            supportive_actions: vec![
                "Take a slow breath".to_string(),
                "Note one thing you're grateful for".to_string(),
            ],
            risk_level: RiskLevel::Low,
            escalation_required: false,
        }))
    }

    /// Queues a failure.
    pub fn with_failure(self, failure: MockFailure) -> Self {
        self.with_outcome(MockOutcome::Error(failure))
    }

    /// Queues an arbitrary outcome.
    pub fn with_outcome(self, outcome: MockOutcome) -> Self {
        self.outcomes
            .lock()
            .expect("mock outcomes poisoned")
            .push_back(outcome);
        self
    }

    /// Sets the simulated latency per call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Sets the availability probe result.
    pub fn with_availability(self, available: bool) -> Self {
        self.available.store(available, Ordering::SeqCst);
        self
    }

    /// Removes the crisis-support capability.
    pub fn without_crisis_support(mut self) -> Self {
        self.has_crisis_support = false;
        self
    }

    /// Number of `generate_response` calls made so far.
    pub fn generate_calls(&self) -> usize {
        self.generate_calls.load(Ordering::SeqCst)
    }

    /// Number of availability probes made so far.
    pub fn probe_calls(&self) -> usize {
        self.probe_calls.load(Ordering::SeqCst)
    }

    /// Flips the availability probe result at runtime.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn next_outcome(&self) -> MockOutcome {
        let mut queue = self.outcomes.lock().expect("mock outcomes poisoned");
        if let Some(outcome) = queue.pop_front() {
            *self.last_outcome.lock().expect("mock outcome poisoned") = Some(outcome.clone());
            return outcome;
        }
        drop(queue);

        self.last_outcome
            .lock()
            .expect("mock outcome poisoned")
            .clone()
            .unwrap_or(MockOutcome::Error(MockFailure::Unavailable {
                message: "mock has no configured outcomes".to_string(),
            }))
    }
}

#[async_trait]
impl Responder for MockResponder {
    async fn generate_response(
        &self,
        _messages: &[ChatMessage],
        _personality: Option<&PersonalityConfig>,
    ) -> Result<SupportReply, ResponderError> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        match self.next_outcome() {
            MockOutcome::Reply(reply) => Ok(reply),
            MockOutcome::Error(failure) => Err(failure.into_error(&self.name)),
        }
    }

    async fn is_available(&self) -> bool {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        self.available.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn crisis_support(&self) -> Option<&dyn CrisisSupport> {
        if self.has_crisis_support {
            Some(self)
        } else {
            None
        }
    }
}

#[async_trait]
impl CrisisSupport for MockResponder {
    async fn analyze_for_crisis(&self, message: &str) -> Result<CrisisAnalysis, ResponderError> {
        // The next queued failure also poisons capability calls, so tests can
        // drive crisis-analysis fallthrough.
        if let MockOutcome::Error(failure) = self.next_outcome() {
            return Err(failure.into_error(&self.name));
        }
        Ok(risk::analyze(message))
    }

    async fn guided_exercise(&self, kind: &str) -> Result<Vec<String>, ResponderError> {
        if let MockOutcome::Error(failure) = self.next_outcome() {
            return Err(failure.into_error(&self.name));
        }
        Ok(exercises::steps_for(kind))
    }
}
