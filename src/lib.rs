//! Reverse-proxy gateway for the IoT telemetry dashboard.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌───────────────────────────────────────────────┐
//!                    │                   GATEWAY                      │
//!                    │                                                │
//!   Browser Request  │  ┌─────────┐   ┌──────────┐   ┌────────────┐  │
//!   ─────────────────┼─▶│  http   │──▶│  proxy:: │──▶│  proxy::   │  │
//!   /proxy/<svc>/…   │  │ server  │   │  routes  │   │  forward   │──┼──▶ Upstream
//!                    │  └─────────┘   └──────────┘   └────────────┘  │    (api/
//!                    │                                                │     producer/
//!   Browser Response │  ┌─────────┐                  ┌────────────┐  │     consumer)
//!   ◀────────────────┼──│ boundary│◀─────────────────│  proxy::   │◀─┼────
//!                    │  │ layers  │                  │   relay    │  │
//!                    │  └─────────┘                  └────────────┘  │
//!                    │                                                │
//!                    │  ┌──────────────────────────────────────────┐  │
//!                    │  │          Cross-Cutting Concerns          │  │
//!                    │  │  ┌────────┐ ┌─────────────┐ ┌─────────┐  │  │
//!                    │  │  │ config │ │observability│ │lifecycle│  │  │
//!                    │  │  └────────┘ └─────────────┘ └─────────┘  │  │
//!                    │  └──────────────────────────────────────────┘  │
//!                    └───────────────────────────────────────────────┘
//! ```
//!
//! The gateway is stateless between requests: the only shared state is the
//! immutable route table and the pooled upstream client. Proxy failures map
//! to structured JSON errors (400/404/502/504/500); nothing is retried and
//! no upstream state is ever fabricated.

// Core subsystems
pub mod config;
pub mod http;
pub mod proxy;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use proxy::ProxyError;
