//! Domain logic shared across responders.
//!
//! Pure, dependency-free building blocks: the keyword risk engine and the
//! guided exercise catalog. Both the local responder and the remote adapters
//! lean on these when the backend itself offers nothing smarter.

pub mod exercises;
pub mod risk;
