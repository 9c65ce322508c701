//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the proxy routes
//! - Wire up boundary middleware (CORS, timeout, request ID, tracing)
//! - Dispatch requests through resolve → forward → relay
//! - Bind the server to a listener and run it until shutdown

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{Request, State};
use axum::http::{header, Method};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::{GatewayConfig, TimeoutConfig};
use crate::http::request::{RequestIdLayer, X_REQUEST_ID};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::proxy::error::ProxyError;
use crate::proxy::forward::{self, ProxyClient};
use crate::proxy::relay;
use crate::proxy::routes::{split_proxy_path, RouteTable};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteTable>,
    pub client: ProxyClient,
    pub timeouts: TimeoutConfig,
}

/// HTTP server for the telemetry gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatewayConfig) -> Self {
        let routes = Arc::new(RouteTable::from_services(&config.services));
        let client = forward::build_client(&config.timeouts);

        tracing::info!(
            services = ?routes.service_names(),
            "Route table compiled"
        );

        let state = AppState {
            routes,
            client,
            timeouts: config.timeouts.clone(),
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        // Boundary policy: the dashboard is served from a different origin,
        // so every response carries permissive CORS headers.
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

        Router::new()
            .route("/proxy", any(proxy_handler))
            .route("/proxy/", any(proxy_handler))
            .route("/proxy/{*path}", any(proxy_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(RequestIdLayer)
            .layer(TraceLayer::new_for_http())
            .layer(cors)
    }

    /// Run the server, accepting connections until ctrl-c.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let shutdown = Shutdown::new();
        let receiver = shutdown.subscribe();
        shutdown.trigger_on_ctrl_c();
        self.run_until(listener, receiver).await
    }

    /// Run the server until the given shutdown signal fires.
    pub async fn run_until(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

/// Main proxy handler.
/// Resolves the service, forwards the request, and relays the response.
async fn proxy_handler(State(state): State<AppState>, request: Request) -> Response {
    let start_time = Instant::now();
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let path = request.uri().path().to_string();
    let method = request.method().to_string();

    let (service, rest) = match split_proxy_path(&path) {
        Ok(parts) => parts,
        Err(err) => {
            tracing::warn!(request_id = %request_id, path = %path, "Malformed proxy path");
            metrics::record_request(&method, err.status().as_u16(), "none", start_time);
            return err.into_response();
        }
    };
    let service = service.to_string();
    let rest = rest.to_string();

    let Some(upstream) = state.routes.resolve(&service) else {
        tracing::warn!(request_id = %request_id, service = %service, "Unknown service");
        let err = ProxyError::UnknownService(service.clone());
        metrics::record_request(&method, err.status().as_u16(), &service, start_time);
        return err.into_response();
    };

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        service = %service,
        path = %path,
        "Proxying request"
    );

    let result = match forward::forward(&state.client, upstream, &rest, request, &state.timeouts)
        .await
    {
        Ok(upstream_response) => relay::relay(upstream_response).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(response) => {
            metrics::record_request(&method, response.status().as_u16(), &service, start_time);
            response
        }
        Err(err) => {
            tracing::error!(
                request_id = %request_id,
                service = %service,
                error = %err,
                "Proxy request failed"
            );
            metrics::record_request(&method, err.status().as_u16(), &service, start_time);
            err.into_response()
        }
    }
}
