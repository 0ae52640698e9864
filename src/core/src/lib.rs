//! Typeconvert Core - Foundational Types
//!
//! Error and configuration types shared by the Dockerfile front end,
//! the typebuild code generator and the command line tool.

pub mod config;
pub mod error;

// Re-export commonly used types
pub use config::{CodegenConfig, FormatterConfig, LogLevel};
pub use error::{ConvertError, Result};

/// Typeconvert version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
