//! Request templates compiled from location directives.
//!
//! # Data Flow
//! ```text
//! Location directives (config file)
//!     → compiler.rs (parse args, resolve $vars to indices)
//!     → RequestTemplate (immutable, Arc-shared)
//!     → LocationTemplates (declaration order preserved)
//!     → read concurrently by every in-flight request
//! ```
//!
//! Templates are compiled once at startup and never mutated afterward, so
//! concurrent readers need no synchronization.

pub mod compiler;

use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, Method};

use crate::error::CompileError;

/// A template field that is either fixed at configuration time or bound to
/// a per-request variable, resolved when the template is executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSource {
    /// Fixed value from the config file.
    Literal(String),
    /// Index into the variable registry, resolved per request.
    Var(usize),
}

/// One literal outbound header line, validated at configuration time.
#[derive(Debug, Clone)]
pub struct HeaderLine {
    pub name: HeaderName,
    pub value: HeaderValue,
}

impl HeaderLine {
    /// Parse a `Name: value` line. Malformed lines are a configuration
    /// error rather than a silently broken outbound request.
    pub fn parse(line: &str) -> Result<Self, CompileError> {
        let invalid = || CompileError::InvalidHeaderLine(line.to_string());
        let (name, value) = line.split_once(':').ok_or_else(invalid)?;
        let name = HeaderName::try_from(name.trim()).map_err(|_| invalid())?;
        let value = HeaderValue::try_from(value.trim()).map_err(|_| invalid())?;
        Ok(Self { name, value })
    }
}

/// Immutable description of one outbound request.
///
/// Created by the compiler from a single `request` / `request_echo`
/// directive, seeded with the location's merged defaults, and shared via
/// `Arc` between the location's template list and any variable binding.
#[derive(Debug)]
pub struct RequestTemplate {
    /// Explicit verb, if the directive or the location default named one.
    /// `None` defers to the executor's defaulting: POST when a body is
    /// present, GET otherwise.
    pub method: Option<Method>,
    /// Outbound URI; always present, literal or variable-bound.
    pub uri: FieldSource,
    /// Outbound body. `None` sends no body. An empty *literal* body also
    /// sends nothing, while a variable body always posts, even when it
    /// resolves to the empty string.
    pub body: Option<FieldSource>,
    /// Literal header lines, attached in declaration order.
    pub headers: Vec<HeaderLine>,
    /// `User-Agent` value; `None` attaches no agent header.
    pub agent: Option<HeaderValue>,
    /// Whether the result is streamed into the inbound response body
    /// rather than exposed as a named value.
    pub echo: bool,
}

/// The ordered templates declared for one routing location.
#[derive(Debug)]
pub struct LocationTemplates {
    /// Routing path prefix this location serves.
    pub path: String,
    /// Declaration order, which is also echo execution order.
    pub templates: Vec<Arc<RequestTemplate>>,
    /// Computed once after all of the location's directives are parsed;
    /// only locations with at least one echo template install a handler.
    pub has_echo: bool,
}
