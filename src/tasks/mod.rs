//! Background Tasks Module
//!
//! Contains background tasks for long-running embedders of the library.
//!
//! # Tasks
//! - TTL Cleanup: sweeps expired cache entries at configured intervals

mod cleanup;

pub use cleanup::spawn_cleanup_task;
