//! Background Tasks Module
//!
//! Contains background tasks that run for the lifetime of the process.
//!
//! # Tasks
//! - Expiry sweep: removes cached documents older than the TTL

mod sweep;

pub use sweep::spawn_sweep_task;
