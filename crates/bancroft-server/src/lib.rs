//! # bancroft-server
//!
//! Thin server binary for the Bancroft portal sign-in flow: TOML
//! configuration with environment overrides, tracing initialization and
//! the axum router from `bancroft-auth`.

pub mod config;
pub mod observability;
pub mod server;

pub use config::{DEFAULT_CONFIG_PATH, LoggingConfig, ServerConfig, load_config};
pub use server::{build_router, run};
