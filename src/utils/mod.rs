//! Utility modules for version-matrix

pub mod errors;
pub mod logger;

// Re-export commonly used items
pub use errors::{VersionMatrixError, display_error_and_exit, enhance_error};
pub use logger::{log_error, log_info, log_warn};
