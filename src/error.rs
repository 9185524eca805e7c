//! Error types shared across the gateway.

use thiserror::Error;

/// Errors raised while compiling directives into request templates.
///
/// All of these are configuration-time errors and fatal to startup: no
/// partially compiled gateway is ever served.
#[derive(Debug, Error)]
pub enum CompileError {
    /// A `$name` reference does not resolve to any known variable.
    #[error("undefined variable: [${0}]")]
    UnknownVariable(String),

    /// A reference token is syntactically broken (e.g. a bare `$`).
    #[error("malformed variable reference: [{0}]")]
    MalformedReference(String),

    /// The trailing token of a `request` directive must name the target
    /// variable with a `$` prefix.
    #[error("invalid target variable name: [{0}]")]
    BadTargetVariable(String),

    /// The directive ended before a URI token was seen.
    #[error("directive is missing the request URI")]
    MissingUri,

    /// A `request` directive ended before its target variable token.
    #[error("directive is missing the target variable")]
    MissingTarget,

    /// More tokens were supplied than the directive form accepts.
    #[error("unexpected trailing argument: [{0}]")]
    TrailingArgument(String),

    /// A literal URI does not parse as an absolute URL.
    #[error("invalid literal URI [{uri}]: {reason}")]
    InvalidLiteralUri { uri: String, reason: String },

    /// A `params` entry is not a valid `Name: value` header line.
    #[error("invalid header line: [{0}]")]
    InvalidHeaderLine(String),

    /// A configured method string is not a valid HTTP token.
    #[error("invalid request method: [{0}]")]
    InvalidMethod(String),

    /// A configured agent string is not a valid header value.
    #[error("invalid agent string: [{0}]")]
    InvalidAgent(String),

    /// A `request` directive tried to declare a variable that shadows a
    /// built-in request variable.
    #[error("variable [${0}] collides with a built-in variable")]
    VariableCollision(String),
}

/// Errors raised while assembling the gateway server at startup.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("failed to build outbound HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Errors raised while executing a compiled template for one inbound
/// request.
///
/// These are always local to the request being handled; they never affect
/// the shared compiled configuration or other in-flight requests.
#[derive(Debug, Error)]
pub enum FetchError {
    /// A referenced variable produced no value for this request.
    #[error("variable [${0}] is not resolvable for this request")]
    Unresolvable(String),

    /// A variable used as a URI or body resolved to non-UTF-8 bytes.
    #[error("variable [${0}] did not resolve to valid UTF-8")]
    NonUtf8Value(String),

    /// The resolved URI string is not a valid absolute URL.
    #[error("invalid outbound URI: [{0}]")]
    InvalidUri(String),

    /// The outbound call failed at the transport level. Note that an HTTP
    /// error status from the upstream is not a transport failure; its body
    /// is captured like any other.
    #[error("outbound request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Variable evaluation recursed past the depth limit, which means a
    /// bound variable ultimately references itself.
    #[error("variable evaluation exceeded the recursion limit")]
    EvaluationDepth,

    /// A template referenced a variable index the registry does not know.
    /// Templates and registry are compiled together, so this indicates a
    /// context built against the wrong registry.
    #[error("unknown variable index: {0}")]
    UnknownIndex(usize),
}
