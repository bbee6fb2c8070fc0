//! Alpha Common - Shared configuration, validation, errors and logging for the
//! alpha research workspace.
//!
//! This crate provides:
//! - Configuration types and loading
//! - Configuration validation
//! - Error types and handling utilities
//! - Logging setup

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod logging;
pub mod validation;

pub use config::{Config, DataConfig, FactorWindowsConfig, ObservabilityConfig, ResearchConfig};
pub use error::{Error, Result, ResultExt};
pub use validation::{Validate, ValidationError, ValidationResult};

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::config::{Config, DataConfig, ResearchConfig};
    pub use crate::error::{Error, Result};
    pub use crate::logging::init_logging;
    pub use crate::validation::{Validate, ValidationError};
}
