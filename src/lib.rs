// For integration tests only, resc ships as a binary
pub mod cli;
pub mod config;
pub mod logging;
pub mod protocol;
pub mod resilience;
pub mod server;
pub mod service;
