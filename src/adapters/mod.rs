//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the orchestration core to concrete AI backends.

pub mod ai;
