//! Common utility functions.

pub mod fs;

// Re-export commonly used items
pub use fs::{append, expand_path};
