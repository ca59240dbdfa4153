use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use service_core::middleware::{metrics_middleware, request_id_middleware, REQUEST_ID_HEADER};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::{self, BRANCH_ID_HEADER};
use crate::middleware::{admission_middleware, REQUEST_TIMEOUT_HEADER};
use crate::AppState;

pub fn build_router(state: AppState) -> Router {
    // Everything here passes the admission gate first
    let gated_routes = Router::new()
        .route(
            "/sales",
            post(handlers::sales::create_sale).get(handlers::sales::list_sales),
        )
        .route("/sales/:id", get(handlers::sales::get_sale))
        .route(
            "/debts",
            post(handlers::debts::create_debt).get(handlers::debts::list_debts),
        )
        .route("/debts/pay", post(handlers::debts::pay_debt))
        .route("/debts/payments", post(handlers::checkout::checkout))
        .route(
            "/debts/payments/:debt_id",
            get(handlers::debts::list_payments),
        )
        .route("/debts/:id", get(handlers::debts::get_debt))
        .route("/clients", get(handlers::clients::list_clients))
        .route("/clients/:id", get(handlers::clients::get_client))
        .route("/companies", get(handlers::company::get_company))
        .route("/branches", get(handlers::company::list_branches))
        .route_layer(from_fn_with_state(state.clone(), admission_middleware));

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::health::metrics))
        .route("/user/login", post(handlers::auth::login))
        .route("/user/refresh", post(handlers::auth::refresh))
        .merge(gated_routes)
        .with_state(state.clone())
        .layer(cors_layer(&state.config.security.allowed_origins))
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
}

/// `*` allows any origin; otherwise only the listed ones. Unparseable entries are dropped.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origin = if allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| match o.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::error!("Invalid CORS origin '{}': {}. Skipping.", o, e);
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static(REQUEST_ID_HEADER),
            HeaderName::from_static(REQUEST_TIMEOUT_HEADER),
            HeaderName::from_static(BRANCH_ID_HEADER),
        ])
}
