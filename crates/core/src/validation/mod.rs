//! Business rule and daily limit validation for transaction intents.
//!
//! - `limits` - Numeric limits and the allow-listed transaction types
//! - `engine` - Checks run by the orchestrator before anything is written

mod engine;
mod limits;

pub use engine::ValidationEngine;
pub use limits::Limits;
