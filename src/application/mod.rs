//! Application layer - orchestration, health tracking, and assembly.
//!
//! This layer coordinates between the responder ports: the orchestrator
//! routes requests across backends, the health tracker maintains circuit
//! state, and the factory wires everything up from configuration.

pub mod factory;
pub mod health;
pub mod orchestrator;

pub use factory::{build_orchestrator, FactoryError};
pub use health::{CircuitSettings, CircuitState, HealthTracker, ResponderStatus};
pub use orchestrator::{
    LocalStatus, Orchestrator, OrchestratorBuilder, OrchestratorError, ProviderStatusReport,
};
