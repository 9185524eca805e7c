//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML config
//! files; every field has a default so minimal configs stay minimal.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, inbound body cap).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Gateway-scope defaults inherited by every location.
    pub defaults: ScopeDefaults,

    /// Routing locations with their request directives.
    pub locations: Vec<LocationConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum buffered inbound body size in bytes. The inbound body must
    /// be buffered before templates run so `$request_body` can resolve.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Outbound connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Inbound request timeout (total handling time) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
        }
    }
}

/// Template defaults for one configuration scope.
///
/// These are the `request_agent`, `request_method` and `request_param`
/// settings. An unset scalar inherits the parent scope's value; an unset
/// `params` list inherits the parent's entire list wholesale, with no
/// per-element merge.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ScopeDefaults {
    /// `User-Agent` attached to outbound requests.
    pub agent: Option<String>,

    /// Default verb for templates that do not name one.
    pub method: Option<String>,

    /// Literal `Name: value` header lines attached to outbound requests.
    pub params: Option<Vec<String>>,
}

impl ScopeDefaults {
    /// Merge a child scope over its parent. Runs exactly once per
    /// location, at configuration compilation; templates snapshot the
    /// result at creation, so later default changes never retroactively
    /// affect already-created templates.
    pub fn merge(parent: &Self, child: &Self) -> Self {
        Self {
            agent: child.agent.clone().or_else(|| parent.agent.clone()),
            method: child.method.clone().or_else(|| parent.method.clone()),
            params: child.params.clone().or_else(|| parent.params.clone()),
        }
    }
}

/// One routing location and its request directives.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LocationConfig {
    /// Path prefix this location serves.
    pub path: String,

    /// Location-level overrides of the gateway-scope defaults.
    #[serde(flatten)]
    pub defaults: ScopeDefaults,

    /// Ordered directives; declaration order is echo execution order.
    #[serde(default)]
    pub directives: Vec<DirectiveConfig>,
}

/// One `request` / `request_echo` directive occurrence.
///
/// `args` carries the raw ordered argument list; the grammar is resolved
/// by the template compiler, not by serde.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DirectiveConfig {
    /// Value-producing form: trailing argument names the target variable.
    Request { args: Vec<String> },
    /// Echo form: the result is streamed into the inbound response body.
    RequestEcho { args: Vec<String> },
}

impl DirectiveConfig {
    pub fn args(&self) -> &[String] {
        match self {
            DirectiveConfig::Request { args } => args,
            DirectiveConfig::RequestEcho { args } => args,
        }
    }
}
