//! Echo response handling.
//!
//! The handler installed for locations holding at least one echo template:
//! runs each echo template in declaration order and streams the collected
//! buffers into the response body. The first failure aborts the whole
//! sequence with no partial output.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use futures_util::stream;
use http_body_util::StreamBody;
use hyper::body::Frame;

use crate::http::middleware::X_REQUEST_ID;
use crate::http::server::AppState;
use crate::vars::context::RequestContext;

/// Ordered sequence of response buffers, streamed without copying. The
/// final buffer terminates the body by ending the stream.
#[derive(Default)]
pub struct OutputChain {
    buffers: Vec<Bytes>,
}

impl OutputChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a buffer to the chain. The bytes are referenced, not copied.
    pub fn push(&mut self, buf: Bytes) {
        self.buffers.push(buf);
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// Convert into a response body that yields each buffer as one frame.
    pub fn into_body(self) -> Body {
        let frames = self
            .buffers
            .into_iter()
            .map(|buf| Ok::<_, Infallible>(Frame::data(buf)));
        Body::new(StreamBody::new(stream::iter(frames)))
    }
}

/// Handler for echo-bearing locations.
pub async fn echo_handler(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();
    let path = request.uri().path().to_string();

    let Some(location) = state.router.match_path(&path) else {
        tracing::debug!(request_id = %request_id, path = %path, "no matching location");
        return (StatusCode::NOT_FOUND, "no matching location").into_response();
    };
    let location = Arc::clone(location);

    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return (StatusCode::PAYLOAD_TOO_LARGE, "inbound body too large").into_response();
        }
    };

    let ctx = RequestContext::new(
        Arc::clone(&state.registry),
        Arc::clone(&state.executor),
        parts,
        body,
        Some(addr),
    );

    let mut chain = OutputChain::new();
    for template in &location.templates {
        if !template.echo {
            continue;
        }
        match state.executor.execute(template, &ctx).await {
            Ok(buf) => chain.push(buf),
            Err(e) => {
                tracing::error!(
                    request_id = %request_id,
                    location = %location.path,
                    error = %e,
                    "echo template failed, aborting sequence"
                );
                // No partial output: any buffers already collected are
                // dropped with the chain.
                return (StatusCode::BAD_GATEWAY, "").into_response();
            }
        }
    }

    if chain.is_empty() {
        return StatusCode::OK.into_response();
    }
    tracing::debug!(
        request_id = %request_id,
        location = %location.path,
        buffers = chain.buffer_count(),
        "echo sequence complete"
    );
    Response::new(chain.into_body())
}
