// Allow unused assignments for diagnostic fields - they're used by the macros
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// Core error type for extended resource objects
#[derive(Error, Debug, Diagnostic)]
pub enum ErsError {
    /// Invalid resource
    #[error("Invalid resource: {reason}")]
    #[diagnostic(code(ers::invalid_resource), help("{suggestion}"))]
    InvalidResource {
        #[allow(unused)]
        reason: String,
        #[allow(unused)]
        suggestion: String,
    },

    /// Illegal lifecycle transition
    #[error("Invalid phase transition for {resource}: {from} -> {to}")]
    #[diagnostic(
        code(ers::invalid_phase_transition),
        help("The record was changed by another actor. Re-read it and retry with its current phase")
    )]
    InvalidPhaseTransition {
        #[allow(unused)]
        resource: String,
        #[allow(unused)]
        from: String,
        #[allow(unused)]
        to: String,
    },

    /// A resource is already claimed by someone else
    #[error("Extended resource {resource} is already claimed by {claimed_by}")]
    #[diagnostic(
        code(ers::already_claimed),
        help("Pick an Available extended resource, or release it from its current claim first")
    )]
    AlreadyClaimed {
        #[allow(unused)]
        resource: String,
        #[allow(unused)]
        claimed_by: String,
    },

    /// Serialization error
    #[error("Serialization error: {message}")]
    #[diagnostic(
        code(ers::serialization_error),
        help("Ensure the resource format is valid JSON or YAML")
    )]
    SerializationError {
        #[allow(unused)]
        message: String,
        #[source]
        #[allow(unused)]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, ErsError>;

impl ErsError {
    /// Create an InvalidResource error
    pub fn invalid_resource(reason: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::InvalidResource {
            reason: reason.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Create an InvalidPhaseTransition error
    pub fn invalid_phase_transition(
        resource: impl Into<String>,
        from: impl ToString,
        to: impl ToString,
    ) -> Self {
        Self::InvalidPhaseTransition {
            resource: resource.into(),
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Create an AlreadyClaimed error
    pub fn already_claimed(resource: impl Into<String>, claimed_by: impl Into<String>) -> Self {
        Self::AlreadyClaimed {
            resource: resource.into(),
            claimed_by: claimed_by.into(),
        }
    }

    /// Create a SerializationError
    pub fn serialization_error(
        message: impl Into<String>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::SerializationError {
            message: message.into(),
            source,
        }
    }
}
