//! Typeconvert CLI - Dockerfile to typebuild converter.

pub mod commands;
