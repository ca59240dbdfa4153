use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use service_core::error::AppError;
use service_core::grpc::proto::product::{Sale, SaleFilter, SaleIdRequest, SaleList};
use tracing::Instrument;

use super::{branch_from_header, resolve_branch};
use crate::dtos::checkout::{CheckoutResponse, SaleCreateRequest};
use crate::middleware::CallScope;
use crate::saga::sale_checkout::{identifies_client, sale_saga, CheckoutState};
use crate::saga::SagaStatus;
use crate::utils::ValidatedJson;
use crate::AppState;

/// Records a sale, creating a walk-in client first when needed.
pub async fn create_sale(
    State(state): State<AppState>,
    scope: CallScope,
    headers: HeaderMap,
    ValidatedJson(req): ValidatedJson<SaleCreateRequest>,
) -> Result<(StatusCode, Json<CheckoutResponse>), AppError> {
    if !identifies_client(req.client_id.as_deref(), req.client_name.as_deref()) {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "client_id or client_name is required"
        )));
    }
    let branch_id = resolve_branch(req.branch_id.as_deref(), &headers)?;

    let deadline = scope.call.deadline;
    let mut sale = CheckoutState::new(
        scope.call,
        scope.caller.subject_id,
        branch_id,
        req.into(),
    );
    let span = sale.span("create_sale");
    let report = sale_saga(state.users.clone(), state.products.clone())
        .run(&mut sale, deadline)
        .instrument(span)
        .await;

    let response = sale.into_response(report);
    let status = match response.status {
        SagaStatus::Completed => StatusCode::CREATED,
        SagaStatus::Partial => StatusCode::OK,
    };
    Ok((status, Json(response)))
}

pub async fn list_sales(
    State(state): State<AppState>,
    scope: CallScope,
    Query(mut filter): Query<SaleFilter>,
) -> Result<Json<SaleList>, AppError> {
    filter.company_id = scope.call.tenant_id.clone();
    let sales = state.products.list_sales(&scope.call, filter).await?;
    Ok(Json(sales))
}

pub async fn get_sale(
    State(state): State<AppState>,
    scope: CallScope,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Sale>, AppError> {
    let request = SaleIdRequest {
        id,
        company_id: scope.call.tenant_id.clone(),
        branch_id: branch_from_header(&headers).unwrap_or_default(),
    };
    let sale = state.products.get_sale(&scope.call, request).await?;
    Ok(Json(sale))
}
