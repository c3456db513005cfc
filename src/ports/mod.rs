//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the orchestration core and the outside world. Adapters implement them.
//!
//! ## Responder Ports
//!
//! - `Responder` - Contract every AI backend implements
//! - `CrisisSupport` - Optional capability for crisis analysis and exercises

mod responder;

pub use responder::{
    ChatMessage, CrisisAnalysis, CrisisSupport, MessageRole, PersonalityConfig, Responder,
    ResponderError, RiskLevel, SupportReply,
};
