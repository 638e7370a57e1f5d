//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) or defaults
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → cloned into the subsystems that need it
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, resolve_config, ConfigError};
pub use schema::AppConfig;
pub use schema::BatchConfig;
pub use schema::ListenerConfig;
pub use schema::ObservabilityConfig;
pub use schema::PacingMode;
pub use schema::SessionConfig;
pub use schema::ShutdownConfig;
