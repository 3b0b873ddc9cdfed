//! Server core functionality
//!
//! The HTTP transport: listener, routing and request framing around the gateway.

pub mod core;
pub mod routes;

pub use core::Server;
