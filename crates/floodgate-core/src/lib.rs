//! # Floodgate Core
//!
//! The domain layer of the admission gateway.
//! Pure admission logic and the ports that infrastructure implements;
//! nothing in this crate performs I/O.

pub mod admission;
pub mod composer;
pub mod config;
pub mod domain;
pub mod error;
pub mod policy;
pub mod ports;

pub use admission::AdmissionController;
pub use composer::{Rejection, ResponseComposer};
pub use config::AdmissionConfig;
pub use error::DomainError;
pub use policy::{Dependency, DependencyPolicy, PolicyTable, Severity};
