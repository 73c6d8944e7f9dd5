//! Nested value model, tree operations, and configuration for nestbank.
//!
//! This crate contains the shared types, the nested-structure utilities,
//! and the configuration logic used across the nestbank workspace.

pub mod config;
pub mod error;
pub mod nested;
pub mod path;
pub mod record;
pub mod value;

pub use config::{AppConfig, FeatureConfig};
pub use error::{CoreError, NestedError};
pub use path::{Key, Path};
pub use record::Record;
pub use value::{Map, Value};
