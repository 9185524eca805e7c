//! Per-request variables.
//!
//! # Data Flow
//! ```text
//! Config time:
//!     $name tokens in directives
//!         → registry.rs (name → index, declare bound variables)
//!
//! Request time:
//!     template execution needs a field value
//!         → context.rs (evaluate built-ins, run bound templates)
//! ```
//!
//! The registry is frozen after compilation; the context is created fresh
//! for each inbound request.

pub mod context;
pub mod registry;

pub use context::RequestContext;
pub use registry::VariableRegistry;
