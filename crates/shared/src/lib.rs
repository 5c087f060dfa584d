//! Shared types, errors, and configuration for Budgetgate.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for type-safe record references
//! - Segment type identifiers and fiscal year labels
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, AuthorizationMode, DatabaseConfig, EngineConfig};
pub use error::{AppError, AppResult};
