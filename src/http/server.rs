//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Compile the configuration into templates and the variable registry
//! - Create the Axum router and wire up middleware
//! - Match inbound paths to echo-bearing locations (longest prefix)
//! - Serve with graceful shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{routing::any, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::executor::RequestExecutor;
use crate::http::echo::echo_handler;
use crate::http::middleware::request_id_middleware;
use crate::template::compiler::compile;
use crate::template::LocationTemplates;
use crate::vars::registry::VariableRegistry;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<LocationRouter>,
    pub registry: Arc<VariableRegistry>,
    pub executor: Arc<RequestExecutor>,
    pub max_body_bytes: usize,
}

/// Matches inbound paths against echo-bearing locations.
///
/// Longest configured prefix wins. Locations without echo templates never
/// install a handler, so requests for them fall through to 404.
#[derive(Debug)]
pub struct LocationRouter {
    locations: Vec<Arc<LocationTemplates>>,
}

impl LocationRouter {
    pub fn from_compiled(locations: &[Arc<LocationTemplates>]) -> Self {
        let mut locations: Vec<_> = locations.iter().filter(|l| l.has_echo).cloned().collect();
        locations.sort_by(|a, b| b.path.len().cmp(&a.path.len()));
        Self { locations }
    }

    pub fn match_path(&self, path: &str) -> Option<&Arc<LocationTemplates>> {
        self.locations.iter().find(|l| path.starts_with(&l.path))
    }
}

/// The gateway HTTP server.
pub struct GatewayServer {
    router: Router,
    config: GatewayConfig,
}

impl GatewayServer {
    /// Compile the configuration and assemble the router. Compilation
    /// failures are fatal: no partially configured server is built.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let compiled = compile(&config)?;
        let executor = Arc::new(RequestExecutor::new(&config.timeouts)?);

        let echo_locations = compiled.locations.iter().filter(|l| l.has_echo).count();
        tracing::info!(
            locations = compiled.locations.len(),
            echo_locations,
            variables = compiled.registry.len(),
            "configuration compiled"
        );

        let state = AppState {
            router: Arc::new(LocationRouter::from_compiled(&compiled.locations)),
            registry: Arc::new(compiled.registry),
            executor,
            max_body_bytes: config.listener.max_body_bytes,
        };
        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(echo_handler))
            .route("/", any(echo_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(axum::middleware::from_fn(request_id_middleware))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "gateway listening");

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("gateway stopped");
        Ok(())
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(path: &str, has_echo: bool) -> Arc<LocationTemplates> {
        Arc::new(LocationTemplates {
            path: path.to_string(),
            templates: Vec::new(),
            has_echo,
        })
    }

    #[test]
    fn longest_prefix_wins() {
        let router = LocationRouter::from_compiled(&[
            location("/api", true),
            location("/api/inner", true),
            location("/", true),
        ]);
        assert_eq!(router.match_path("/api/inner/x").unwrap().path, "/api/inner");
        assert_eq!(router.match_path("/api/other").unwrap().path, "/api");
        assert_eq!(router.match_path("/else").unwrap().path, "/");
    }

    #[test]
    fn non_echo_locations_are_not_routed() {
        let router = LocationRouter::from_compiled(&[location("/values", false)]);
        assert!(router.match_path("/values").is_none());
    }
}
