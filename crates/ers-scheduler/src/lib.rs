//! ERS Scheduler - extended resource placement
//!
//! This crate provides:
//! - Label selector matching and node affinity evaluation
//! - The allocation planner that maps claims to resources per node
//! - State synchronization of reservations and pod binding
//! - `ExtendedResourceScheduler`, which runs filter and bind calls

pub mod affinity;
pub mod bind;
pub mod error;
pub mod extender;
pub mod filter;
pub mod planner;
pub mod selector;
pub mod sync;
pub mod types;

// Re-export commonly used types
pub use affinity::{node_satisfies_affinity, resource_usable_on};
pub use bind::BindingFinalizer;
pub use error::{Result, SchedulerError};
pub use extender::{ExtendedResourceScheduler, SchedulerConfig};
pub use planner::{AllocationPlanner, Plan};
pub use selector::{contains_all, evaluate, Operator, Requirement, Selector, SelectorError, Term};
pub use sync::StateSynchronizer;
pub use types::{FilterResult, PredicateResult, SchedulingContext};
