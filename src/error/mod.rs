//! Error types for the chat backend.
//!
//! The taxonomy is small on purpose: invalid input (participants or
//! message payloads), unknown ids, failed credentials, and storage
//! failures. Uniqueness races on conversation creation are recovered
//! inside the resolver and never reach this layer.

pub mod conversion;
pub mod types;

pub use types::ApiError;
