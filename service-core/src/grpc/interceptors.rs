//! Outbound metadata for downstream gRPC calls.
//!
//! Every request leaving the gateway carries the caller's tenant as
//! `company_id` metadata, the inbound `x-request-id`, the W3C trace context
//! when a span is active, and a `grpc-timeout` derived from the request
//! deadline.

use std::time::Duration;

use opentelemetry::trace::TraceContextExt;
use tokio::time::Instant;
use tonic::Request;
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// gRPC metadata key for W3C traceparent header.
pub const TRACEPARENT_KEY: &str = "traceparent";

/// gRPC metadata key for W3C tracestate header.
pub const TRACESTATE_KEY: &str = "tracestate";

/// gRPC metadata key for request ID.
pub const REQUEST_ID_KEY: &str = "x-request-id";

/// gRPC metadata key carrying the caller's tenant.
pub const COMPANY_ID_KEY: &str = "company_id";

/// Per-request scope of a downstream call: whose tenant it runs in, which
/// inbound request caused it, and when it must be finished.
#[derive(Clone, Debug, Default)]
pub struct CallContext {
    pub tenant_id: String,
    pub request_id: Option<String>,
    pub deadline: Option<Instant>,
}

impl CallContext {
    pub fn new(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            ..Default::default()
        }
    }

    /// Context for calls made before a caller is known (login).
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_request_id(mut self, request_id: Option<String>) -> Self {
        self.request_id = request_id;
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Time left until the deadline. `Some(ZERO)` once it has passed.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    pub fn is_expired(&self) -> bool {
        matches!(self.remaining(), Some(left) if left.is_zero())
    }
}

/// Wrap a message in a `Request` scoped to `ctx`.
pub fn scoped_request<T>(ctx: &CallContext, message: T) -> Request<T> {
    let mut request = Request::new(message);
    inject_call_context(&mut request, ctx);
    request
}

/// Inject tenant, request id, timeout and trace context into outgoing metadata.
pub fn inject_call_context<T>(request: &mut Request<T>, ctx: &CallContext) {
    inject_trace_context(request);

    if !ctx.tenant_id.is_empty()
        && let Ok(value) = ctx.tenant_id.parse()
    {
        request.metadata_mut().insert(COMPANY_ID_KEY, value);
    }

    if let Some(request_id) = ctx.request_id.as_deref()
        && let Ok(value) = request_id.parse()
    {
        request.metadata_mut().insert(REQUEST_ID_KEY, value);
    }

    if let Some(remaining) = ctx.remaining() {
        request.set_timeout(remaining);
    }
}

/// Inject current trace context into outgoing gRPC request metadata.
pub fn inject_trace_context<T>(request: &mut Request<T>) {
    let span = Span::current();
    let context = span.context();
    let otel_span = context.span();
    let span_context = otel_span.span_context();

    if span_context.is_valid() {
        // Format: version-trace_id-span_id-trace_flags
        let traceparent = format!(
            "00-{}-{}-{:02x}",
            span_context.trace_id(),
            span_context.span_id(),
            span_context.trace_flags().to_u8()
        );

        if let Ok(value) = traceparent.parse() {
            request.metadata_mut().insert(TRACEPARENT_KEY, value);
        }

        let tracestate_str = span_context.trace_state().header();
        if !tracestate_str.is_empty()
            && let Ok(value) = tracestate_str.parse()
        {
            request.metadata_mut().insert(TRACESTATE_KEY, value);
        }
    }
}
