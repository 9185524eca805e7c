//! Request ID middleware.
//!
//! Ensures every inbound request carries an `x-request-id` header so log
//! lines from template execution can be correlated.

use axum::{
    body::Body,
    http::{HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Attach a UUID request ID when the client did not send one.
pub async fn request_id_middleware(mut req: Request<Body>, next: Next) -> Response {
    if !req.headers().contains_key(X_REQUEST_ID) {
        let id = Uuid::new_v4().to_string();
        if let Ok(value) = HeaderValue::from_str(&id) {
            req.headers_mut().insert(X_REQUEST_ID, value);
        }
    }
    next.run(req).await
}
