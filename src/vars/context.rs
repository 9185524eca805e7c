//! Request-time variable evaluation.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{request::Parts, HeaderMap, Method, Uri};
use bytes::Bytes;
use futures_util::future::BoxFuture;

use crate::error::FetchError;
use crate::executor::RequestExecutor;
use crate::vars::registry::{VarKind, VariableRegistry};

/// Bound-variable chains deeper than this indicate a reference cycle.
const MAX_EVAL_DEPTH: usize = 16;

/// The live inbound request, as seen by variable evaluation.
///
/// One context exists per inbound request. Reads of bound variables run
/// the executor on every read; nothing is memoized, so two reads of the
/// same variable can observe two different upstream responses.
pub struct RequestContext {
    registry: Arc<VariableRegistry>,
    executor: Arc<RequestExecutor>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    remote_addr: Option<SocketAddr>,
}

impl RequestContext {
    /// Build a context from decomposed inbound request parts. The body
    /// must already be buffered so `$request_body` resolves without
    /// consuming anything.
    pub fn new(
        registry: Arc<VariableRegistry>,
        executor: Arc<RequestExecutor>,
        parts: Parts,
        body: Bytes,
        remote_addr: Option<SocketAddr>,
    ) -> Self {
        Self {
            registry,
            executor,
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
            remote_addr,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    /// Evaluate the variable at `index`.
    pub async fn get(&self, index: usize) -> Result<Bytes, FetchError> {
        self.eval(index, 0).await
    }

    /// Evaluate a variable by name. Convenient for consumers that did not
    /// keep the compiled index around.
    pub async fn read(&self, name: &str) -> Result<Bytes, FetchError> {
        let index = self
            .registry
            .lookup(name)
            .ok_or_else(|| FetchError::Unresolvable(name.to_string()))?;
        self.eval(index, 0).await
    }

    /// Registered name of the variable at `index`, for error reporting.
    pub(crate) fn var_name(&self, index: usize) -> String {
        self.registry
            .slot(index)
            .map(|s| s.name.clone())
            .unwrap_or_else(|| format!("#{index}"))
    }

    /// Recursive evaluation. Bound templates may themselves reference
    /// variables, so the future is boxed and the depth tracked.
    pub(crate) fn eval(
        &self,
        index: usize,
        depth: usize,
    ) -> BoxFuture<'_, Result<Bytes, FetchError>> {
        Box::pin(async move {
            if depth > MAX_EVAL_DEPTH {
                return Err(FetchError::EvaluationDepth);
            }
            let slot = self
                .registry
                .slot(index)
                .ok_or(FetchError::UnknownIndex(index))?;
            match &slot.kind {
                VarKind::Builtin(f) => {
                    f(self).ok_or_else(|| FetchError::Unresolvable(slot.name.clone()))
                }
                VarKind::Header(name) => self
                    .headers
                    .get(name)
                    .map(|v| Bytes::copy_from_slice(v.as_bytes()))
                    .ok_or_else(|| FetchError::Unresolvable(slot.name.clone())),
                VarKind::Bound(template) => {
                    self.executor.execute_at(template, self, depth + 1).await
                }
            }
        })
    }
}
