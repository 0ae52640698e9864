//! Typeconvert Codegen - Dockerfile to typebuild translation.
//!
//! This crate provides the Dockerfile front end (stages and typed
//! instructions) and the code generator that turns every stage into a
//! typebuild module.

#![allow(clippy::result_large_err)]

pub mod dockerfile;
pub mod typebuild;

// Re-export common types
pub use dockerfile::{ArgCommand, Dockerfile, Instruction, Mount, MountKind, RunCommand, Stage};
pub use typebuild::{generate, CodegenReport};

/// Typeconvert Codegen version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
