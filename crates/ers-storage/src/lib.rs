//! ERS Storage - persistence for extended resources and claims
//!
//! This crate provides:
//! - The `ExtendedResourceStore` interface used by the scheduler
//! - A version-checked store over a local redb database
//! - A client for Kubernetes-compatible API servers

pub mod api_client;
pub mod encoding;
pub mod error;
pub mod kv;
pub mod kv_store;
pub mod redb_backend;
pub mod store;

// Re-export commonly used types
pub use api_client::ApiClient;
pub use encoding::KeyEncoder;
pub use error::{Result, StorageError};
pub use kv::{KVStore, Transaction};
pub use kv_store::KvResourceStore;
pub use redb_backend::RedbBackend;
pub use store::{pod_binding, ExtendedResourceStore};
