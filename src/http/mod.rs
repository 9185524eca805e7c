//! HTTP serving subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, location matching)
//!     → echo.rs (run echo templates in order, assemble output chain)
//!     → Send to client
//! ```

pub mod echo;
pub mod middleware;
pub mod server;

pub use server::{AppState, GatewayServer, LocationRouter};
