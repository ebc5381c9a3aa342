use ers_scheduler::ExtendedResourceScheduler;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Runs filter and bind calls against the resource store
    pub scheduler: Arc<ExtendedResourceScheduler>,
}

impl AppState {
    pub fn new(scheduler: Arc<ExtendedResourceScheduler>) -> Self {
        Self { scheduler }
    }
}
