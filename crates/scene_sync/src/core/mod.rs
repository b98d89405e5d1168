//! # Core Module
//!
//! Shared abstractions used by every subsystem.
//!
//! ## Organization
//!
//! - **Config**: Unified configuration for logging, identifiers, aliasing and setup
//! - **Foundation**: Low-level utilities (math, logging)

pub mod config;

// Re-export foundation modules for convenience
pub use crate::foundation;

// Re-export commonly used config types
pub use config::{
    SceneSyncConfig,
    LoggingConfig,
    IdentifierConfig,
    AliasConfig,
    SetupConfig,
    Config,
    ConfigError,
};
