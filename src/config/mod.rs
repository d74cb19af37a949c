//! Aegis Configuration Module
//!
//! Deployment configuration loaded from TOML, replacing hardcoded stream,
//! anomaly and model settings with operator-tunable values.
//!
//! ## Loading Order
//!
//! 1. `AEGIS_CONFIG` environment variable (path to TOML file)
//! 2. `aegis_config.toml` in the current working directory
//! 3. Built-in defaults (see [`defaults`])
//!
//! The loaded config is owned by [`AppContext`](crate::pipeline::AppContext)
//! and passed to whatever needs it; there is no process-wide global.

mod aegis_config;
pub mod defaults;
pub mod validation;

pub use aegis_config::*;
