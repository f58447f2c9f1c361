//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) or mode string
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → LogConfig (validated, immutable)
//!     → logging::registry builds sinks from it
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require re-initialization
//! - All fields have defaults so a bare mode string is a full config
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{LogConfig, Mode, RotationPolicy};
pub use validation::{validate_config, ValidationError};
