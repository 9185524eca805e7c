//! Outbound request execution.
//!
//! # Data Flow
//! ```text
//! RequestTemplate + RequestContext
//!     → resolve deferred fields (URI, body) against the live request
//!     → perform the outbound call (shared reqwest client)
//!     → stream the response body into a ChunkedCapture
//!     → linearize into one contiguous buffer
//! ```
//!
//! Each execution owns its capture exclusively; nothing is shared between
//! in-flight executions, so no locking is involved.

pub mod capture;

use std::time::Duration;

use axum::http::header::USER_AGENT;
use axum::http::Method;
use bytes::Bytes;
use reqwest::redirect::Policy;

use crate::config::schema::TimeoutConfig;
use crate::error::FetchError;
use crate::executor::capture::ChunkedCapture;
use crate::template::{FieldSource, RequestTemplate};
use crate::vars::context::RequestContext;

/// Drives compiled templates against live requests.
///
/// Holds the shared outbound HTTP client; cheap to share via `Arc`.
pub struct RequestExecutor {
    client: reqwest::Client,
}

impl RequestExecutor {
    /// Build an executor with its own client. Redirects are followed, as
    /// upstream endpoints frequently answer with one.
    pub fn new(timeouts: &TimeoutConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .redirect(Policy::limited(10))
            .build()?;
        Ok(Self { client })
    }

    /// Wrap an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Execute one template against the inbound request context and return
    /// the full upstream response body.
    ///
    /// Only transport-level problems (resolution, connect, read) are
    /// failures; an upstream HTTP error status still yields its body.
    pub async fn execute(
        &self,
        template: &RequestTemplate,
        ctx: &RequestContext,
    ) -> Result<Bytes, FetchError> {
        self.execute_at(template, ctx, 0).await
    }

    /// Depth-carrying variant used by bound-variable evaluation, which may
    /// re-enter the executor.
    pub(crate) async fn execute_at(
        &self,
        template: &RequestTemplate,
        ctx: &RequestContext,
        depth: usize,
    ) -> Result<Bytes, FetchError> {
        let uri_text = match &template.uri {
            FieldSource::Literal(s) => s.clone(),
            FieldSource::Var(i) => {
                let raw = ctx.eval(*i, depth).await?;
                String::from_utf8(raw.to_vec())
                    .map_err(|_| FetchError::NonUtf8Value(ctx.var_name(*i)))?
            }
        };
        let url = reqwest::Url::parse(&uri_text)
            .map_err(|_| FetchError::InvalidUri(uri_text.clone()))?;

        let body = match &template.body {
            None => None,
            // An empty literal body sends nothing; a variable body always
            // posts, even when it resolves empty.
            Some(FieldSource::Literal(s)) if s.is_empty() => None,
            Some(FieldSource::Literal(s)) => Some(Bytes::from(s.clone())),
            Some(FieldSource::Var(i)) => Some(ctx.eval(*i, depth).await?),
        };

        // Explicit GET is parameter-less; an unset method becomes POST
        // exactly when a body is present.
        let (method, body) = match &template.method {
            None if body.is_some() => (Method::POST, body),
            None => (Method::GET, None),
            Some(m) if *m == Method::GET => (Method::GET, None),
            Some(m) => (m.clone(), body),
        };

        let mut req = self.client.request(method.clone(), url);
        if let Some(agent) = &template.agent {
            req = req.header(USER_AGENT, agent.clone());
        }
        for line in &template.headers {
            req = req.header(line.name.clone(), line.value.clone());
        }
        if let Some(b) = body {
            req = req.body(b);
        }

        let mut response = req.send().await.map_err(|e| {
            tracing::error!(uri = %uri_text, error = %e, "outbound request failed");
            FetchError::Transport(e)
        })?;
        let status = response.status();

        let mut captured = ChunkedCapture::new();
        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => captured.append(&chunk),
                Ok(None) => break,
                Err(e) => {
                    tracing::error!(uri = %uri_text, error = %e, "outbound body read failed");
                    return Err(FetchError::Transport(e));
                }
            }
        }

        tracing::debug!(
            uri = %uri_text,
            method = %method,
            status = %status,
            bytes = captured.len(),
            "outbound response captured"
        );
        Ok(captured.into_bytes())
    }
}
