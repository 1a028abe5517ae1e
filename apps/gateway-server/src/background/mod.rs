//! Background jobs.

#[cfg(feature = "scheduler")]
pub mod scheduler;
