//! Outbound request gateway.
//!
//! For each inbound request routed to a configured location, the gateway
//! synthesizes one or more outbound HTTP requests whose method, URI, body
//! and headers come partly from static configuration and partly from
//! values carried by the inbound request. An outbound response is either
//! streamed directly into the inbound response body ("echo") or exposed
//! as a lazily computed named value that later templates can reference.
//!
//! # Architecture Overview
//!
//! ```text
//! config file (TOML)
//!     → config::loader                     (parse)
//!     → template::compiler                 (directives → templates,
//!                                           $vars → registry indices)
//!     → CompiledGateway                    (immutable, Arc-shared)
//!
//! inbound request
//!     → http::server   (match location, buffer body)
//!     → http::echo     (run echo templates in declaration order)
//!     → executor       (resolve fields, outbound call, chunked capture)
//!     → vars::context  (built-ins, bound-variable reads re-enter executor)
//!     → response body  (zero-copy output chain)
//! ```

// Core subsystems
pub mod config;
pub mod executor;
pub mod http;
pub mod template;
pub mod vars;

// Cross-cutting concerns
pub mod error;
pub mod lifecycle;

pub use config::{load_config, GatewayConfig};
pub use error::{CompileError, FetchError, GatewayError};
pub use executor::RequestExecutor;
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
pub use template::compiler::{compile, CompiledGateway};
pub use vars::{RequestContext, VariableRegistry};
