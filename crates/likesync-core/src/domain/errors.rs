//! Domain error types
//!
//! This module defines error types specific to domain operations,
//! including identifier validation and invalid run state transitions.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid remote track identifier
    #[error("Invalid remote ID: {0}")]
    InvalidRemoteId(String),

    /// Invalid state transition attempt
    #[error("Invalid state transition from {from} to {to}")]
    InvalidState {
        /// The current state
        from: String,
        /// The attempted target state
        to: String,
    },

    /// Unknown stored value for an enumerated field
    #[error("Unknown {field} value: {value}")]
    UnknownValue {
        /// Name of the field being parsed
        field: &'static str,
        /// The offending value
        value: String,
    },

    /// ID parsing error
    #[error("Invalid ID format: {0}")]
    InvalidId(String),
}
