//! Proxy core subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (/proxy/<service>/<rest>?<query>)
//!     → routes.rs (resolve <service> to an upstream, or fail)
//!     → forward.rs (sanitize headers, rebuild URI, stream body upstream)
//!     → relay.rs (buffer upstream body, normalize JSON or pass through)
//!     → Response to client
//!
//! Route Compilation (at startup):
//!     ServiceConfig[]
//!     → RouteTable::from_services
//!     → Freeze as immutable table behind Arc
//! ```
//!
//! # Design Decisions
//! - Service table compiled at startup, immutable at runtime
//! - Explicit typed failures rather than silent defaults; every error
//!   surfaces to the caller as a structured JSON body
//! - Nothing is retried; retry policy belongs to the caller
//! - The relay never starts a response before the full upstream body has
//!   been observed, so status/headers/body always form one message

pub mod error;
pub mod forward;
pub mod relay;
pub mod routes;

pub use error::ProxyError;
pub use forward::ProxyClient;
pub use routes::{split_proxy_path, RouteTable, Upstream, PROXY_PREFIX};
