//! Utility modules for deployhub
//!
//! - Structured logging setup and configuration
//! - The `define_id_enum!` macro for string-tagged identifiers

pub mod id_enum;
pub mod logging;

pub use logging::{init_default, init_from_env, init_logging, LoggingConfig};
