pub mod extender;
pub mod health;

// Re-export handler functions
pub use extender::*;
pub use health::*;
