//! GradeVault Common - Shared utilities and types
//!
//! This crate provides common functionality used across all GradeVault
//! components:
//! - Error types and handling
//! - Configuration management
//! - Common type definitions (operation descriptors, audit records)

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use types::*;
