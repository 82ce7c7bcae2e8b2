//! LabChat Core Library
//!
//! Foundational utilities shared by every LabChat crate:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::{AppConfig, FilterThresholds, GenerationParams, SearchConfig};
pub use error::{AppError, AppResult};
