//! Per-request scope for downstream calls.
//!
//! Every handler that talks to a backend takes a [`CallScope`]: the admitted
//! caller, the inbound request id and a deadline. The deadline defaults to
//! the configured downstream timeout and can be shortened (never extended)
//! with `x-request-timeout-ms`.

use std::time::Duration;

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use service_core::error::AppError;
use service_core::grpc::CallContext;
use service_core::middleware::{RequestId, REQUEST_ID_HEADER};
use tokio::time::Instant;

use super::auth::RequestContext;
use crate::AppState;

pub const REQUEST_TIMEOUT_HEADER: &str = "x-request-timeout-ms";

/// Deadline for this request: `now + min(header, ceiling)`.
pub fn request_deadline(headers: &HeaderMap, ceiling: Duration) -> Instant {
    let requested = headers
        .get(REQUEST_TIMEOUT_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis);

    let budget = match requested {
        Some(requested) => requested.min(ceiling),
        None => ceiling,
    };

    Instant::now() + budget
}

/// Inbound request id, set by `request_id_middleware`.
pub fn request_id(parts: &Parts) -> Option<String> {
    parts
        .extensions
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .or_else(|| {
            parts
                .headers
                .get(REQUEST_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string())
        })
}

/// Admitted caller plus the call context handed to downstream clients.
#[derive(Debug, Clone)]
pub struct CallScope {
    pub caller: RequestContext,
    pub call: CallContext,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for CallScope {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let caller = RequestContext::from_request_parts(parts, state).await?;
        let deadline = request_deadline(&parts.headers, state.config.downstream.timeout());

        let call = CallContext::new(caller.tenant_id.clone())
            .with_request_id(request_id(parts))
            .with_deadline(deadline);

        Ok(Self { caller, call })
    }
}

/// Call context for requests made before anyone is authenticated.
#[derive(Debug, Clone)]
pub struct AnonymousScope(pub CallContext);

#[axum::async_trait]
impl FromRequestParts<AppState> for AnonymousScope {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let deadline = request_deadline(&parts.headers, state.config.downstream.timeout());
        Ok(Self(
            CallContext::anonymous()
                .with_request_id(request_id(parts))
                .with_deadline(deadline),
        ))
    }
}
