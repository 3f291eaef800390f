//! Application Layer
//!
//! Configuration and the facade collaborators use to reach the codecs.

pub mod config;
pub mod contracts;

// Re-exports
pub use config::ContractsConfig;
pub use contracts::Contracts;
