//! Configuration module for GemmForge
//!
//! Provides configuration management including CLI arguments,
//! env-var fallbacks, and runtime settings.

mod settings;

pub use settings::*;
