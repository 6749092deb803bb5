//! HTTP host for the registration module: configuration, logging, routing
//! and graceful shutdown.

pub mod config;
pub mod cors;
pub mod logging;
pub mod server;
pub mod signals;

pub use config::AppConfig;
pub use server::{build_router, serve};
