//! Activity accounting for the gesture pipeline.
//!
//! Tracks what a session did without keeping any of the camera or landmark
//! data it saw.

pub mod log;

// Re-export commonly used types
pub use log::{
    create_shared_log, create_shared_log_with_persistence, ActivityLog, ActivityStats,
    SharedActivityLog,
};
