//! MindBridge - Offline-first AI support orchestration
//!
//! This crate routes mental-health support conversations across multiple AI
//! backends with per-call timeouts, circuit-breaker health tracking, and a
//! guaranteed local fallback, so a supportive reply is always produced even
//! when every remote service is down.
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture:
//!
//! - [`ports`] - the `Responder` contract and shared conversation types
//! - [`adapters`] - concrete backends (local templates, OpenAI, sidecar, mock)
//! - [`application`] - the orchestrator, circuit health tracking, and factory
//! - [`domain`] - pure crisis-keyword analysis and the exercise catalog
//! - [`config`] - environment-driven configuration
//!
//! # Example
//!
//! ```no_run
//! use mindbridge::application::build_orchestrator;
//! use mindbridge::config::AppConfig;
//! use mindbridge::ports::ChatMessage;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::load()?;
//! let orchestrator = build_orchestrator(&config)?;
//!
//! let reply = orchestrator
//!     .generate_response(&[ChatMessage::user("I'm feeling overwhelmed")], None)
//!     .await?;
//! println!("{}", reply.message);
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
