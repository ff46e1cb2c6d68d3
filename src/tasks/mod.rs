//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Expiry sweep: purges completed entries past their TTL from every
//!   registered cache

mod sweep;

pub use sweep::spawn_sweep_task;
