pub mod codec;
pub mod config;
pub mod error;
pub mod gateway;
pub mod middleware;
pub mod server;
pub mod storage;
pub mod utils;

pub use server::Server;
