//! AI responder adapters.
//!
//! Implementations of the `Responder` port for each backend:
//!
//! - `LocalResponder` - Template-based offline responder, always available
//! - `OpenAiResponder` - OpenAI chat completions
//! - `SidecarResponder` - Healthcare-search HTTP sidecar
//! - `MockResponder` - Scriptable mock for testing

mod local;
mod mock;
mod openai;
mod sidecar;

pub use local::LocalResponder;
pub use mock::{MockFailure, MockOutcome, MockResponder};
pub use openai::{OpenAiConfig, OpenAiResponder};
pub use sidecar::{SidecarConfig, SidecarResponder};
