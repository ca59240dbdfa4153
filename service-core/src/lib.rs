//! service-core: Shared infrastructure for the CRM gateway and its downstream clients.
pub mod config;
pub mod error;
pub mod grpc;
pub mod middleware;
pub mod observability;

pub use axum;
pub use prost;
pub use tokio;
pub use tonic;
pub use tracing;
