//! ERS Extender - HTTP surface of the scheduler extender
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - The filter (`/predicates/ers`) and bind (`/bind/ers`) endpoints
//! - Wire types for scheduler extender requests and responses
//! - Health and readiness probes

pub mod error;
pub mod handlers;
pub mod server;
pub mod state;
pub mod wire;

// Re-export commonly used types
pub use error::{ApiError, Result};
pub use server::{build_router, Config, ExtenderServer};
pub use state::AppState;
pub use wire::{ExtenderArgs, ExtenderBindingArgs, ExtenderFilterResult, NodeList};
