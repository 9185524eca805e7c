//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → template::compiler (directives → request templates)
//!     → CompiledGateway (validated, immutable)
//!     → shared via Arc by all in-flight requests
//! ```
//!
//! Configuration is immutable once compiled; it lives for the lifetime of
//! the process.

pub mod loader;
pub mod schema;

pub use loader::{load_config, ConfigError};
pub use schema::{DirectiveConfig, GatewayConfig, LocationConfig, ScopeDefaults};
