// Allow unused assignments for diagnostic fields - they're used by the macros
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// Scheduler error type
#[derive(Error, Debug, Diagnostic)]
pub enum SchedulerError {
    /// The pod references no claims at all
    #[error("extendedResourceClaims is empty for pod {pod}")]
    #[diagnostic(
        code(scheduler::no_claims),
        help("Pods routed to this extender must list extendedResourceClaims on at least one container")
    )]
    NoClaims { pod: String },

    /// A referenced claim does not exist
    #[error("ExtendedResourceClaim {namespace}/{name} not found")]
    #[diagnostic(
        code(scheduler::claim_not_found),
        help("Create the claim in the pod's namespace before scheduling the pod")
    )]
    ClaimNotFound { namespace: String, name: String },

    /// A claim that asks for nothing
    #[error("ExtendedResourceNames and ExtendedResourceNum are empty in claim {namespace}/{name}")]
    #[diagnostic(
        code(scheduler::empty_claim),
        help("Set extendResourceNum or list extendedResourceNames on the claim")
    )]
    EmptyClaim { namespace: String, name: String },

    /// Bind request is missing required fields
    #[error("Invalid binding: {message}")]
    #[diagnostic(
        code(scheduler::invalid_binding),
        help("Bind requests need podNamespace, podName and node")
    )]
    InvalidBinding { message: String },

    /// Storage error
    #[error("Storage error: {0}")]
    #[diagnostic(
        code(scheduler::storage_error),
        help("Check the underlying storage system")
    )]
    StorageError(#[from] ers_storage::StorageError),

    /// Core error
    #[error("Core error: {0}")]
    #[diagnostic(
        code(scheduler::core_error),
        help("This is an internal error")
    )]
    CoreError(#[from] ers_core::ErsError),

    /// Internal error
    #[error("Internal error: {message}")]
    #[diagnostic(
        code(scheduler::internal_error),
        help("This is likely a bug. Please report it")
    )]
    InternalError { message: String },
}

/// Result type for scheduler operations
pub type Result<T> = std::result::Result<T, SchedulerError>;

impl SchedulerError {
    /// Create a NoClaims error
    pub fn no_claims(pod: impl Into<String>) -> Self {
        Self::NoClaims { pod: pod.into() }
    }

    /// Create a ClaimNotFound error
    pub fn claim_not_found(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::ClaimNotFound {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Create an EmptyClaim error
    pub fn empty_claim(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::EmptyClaim {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Create an InvalidBinding error
    pub fn invalid_binding(message: impl Into<String>) -> Self {
        Self::InvalidBinding {
            message: message.into(),
        }
    }

    /// Create an InternalError
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }

    /// Whether a store write was rejected because the record changed underneath us
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::StorageError(e) if e.is_conflict())
    }
}
