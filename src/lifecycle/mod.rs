//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     Load config → Compile templates → Bind listener → Serve
//!
//! Shutdown (shutdown.rs):
//!     Ctrl-C received → broadcast → server drains and exits
//! ```

pub mod shutdown;

pub use shutdown::Shutdown;
