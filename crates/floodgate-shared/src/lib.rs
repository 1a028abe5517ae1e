//! # Floodgate Shared
//!
//! Wire types shared by the gateway and its clients.
//! Everything here is plain data with serde derives.

pub mod dto;
pub mod response;

pub use response::{ErrorCode, ErrorResponse, FieldError};
