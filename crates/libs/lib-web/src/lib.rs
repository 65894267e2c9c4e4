//! # Web Library
//!
//! HTTP handlers, middleware, services, and server setup for the buy-crypto API.

pub mod handlers;
pub mod middleware;
pub mod services;
pub mod server;

pub use server::{build_state, create_router, start_server, AppState, ServerConfig};
