//! AgriSage prediction server
//!
//! Router and configuration are exposed as a library so integration
//! tests can drive the service without binding a socket.

pub mod api;
pub mod config;

pub use api::{create_router, AppState};
pub use config::ServerConfig;
