//! Error handling
//!
//! Defines error types and their HTTP rendering for the gateway.

pub mod handlers;
pub mod types;

pub use types::*;
