pub mod attendance;
pub mod error;
pub mod identifier;
pub mod ports;
pub mod repo;
pub mod service;
