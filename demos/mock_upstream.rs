//! A pretend telemetry backend for exercising the gateway by hand.
//!
//! Run it, point a service at 127.0.0.1:8083, and curl through
//! `/proxy/<service>/...`.

use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use std::net::SocketAddr;

#[tokio::main]
async fn main() {
    let app = Router::new()
        .route(
            "/sensors/latest",
            get(|| async { Json(json!({ "sensorId": 5, "temperature": 21.5, "unit": "C" })) }),
        )
        .route("/health", get(|| async { Json(json!({ "status": "UP" })) }));

    let addr = SocketAddr::from(([127, 0, 0, 1], 8083));
    println!("Mock telemetry upstream listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
