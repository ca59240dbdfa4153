use axum::{extract::State, http::HeaderMap, Json};
use service_core::error::AppError;
use tracing::Instrument;

use super::resolve_branch;
use crate::dtos::checkout::{CheckoutRequest, CheckoutResponse};
use crate::middleware::CallScope;
use crate::saga::sale_checkout::{checkout_saga, identifies_client, CheckoutState};
use crate::saga::SagaStatus;
use crate::utils::ValidatedJson;
use crate::AppState;

/// Sale, debt and first installment in one call.
///
/// Always answers 200 once the saga has started; a partial result lists the
/// step that failed next to the identifiers of the steps that succeeded.
pub async fn checkout(
    State(state): State<AppState>,
    scope: CallScope,
    headers: HeaderMap,
    ValidatedJson(req): ValidatedJson<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, AppError> {
    if !identifies_client(req.client_id.as_deref(), req.client_name.as_deref()) {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "client_id or client_name is required"
        )));
    }
    let branch_id = resolve_branch(req.branch_id.as_deref(), &headers)?;

    let deadline = scope.call.deadline;
    let mut checkout = CheckoutState::new(scope.call, scope.caller.subject_id, branch_id, req);
    let saga = checkout_saga(
        state.users.clone(),
        state.products.clone(),
        state.debts.clone(),
    );

    let span = checkout.span("sale_checkout");
    let report = saga.run(&mut checkout, deadline).instrument(span).await;
    let failed_step = report.failed_step().map(|r| r.step);
    let subject_id = checkout.seller_id.clone();
    let tenant_id = checkout.call.tenant_id.clone();
    let response = checkout.into_response(report);

    match response.status {
        SagaStatus::Completed => tracing::info!(
            subject_id = %subject_id,
            tenant_id = %tenant_id,
            sale_id = response.sale.as_ref().map(|s| s.id.as_str()).unwrap_or("-"),
            debt_id = response.debt.as_ref().map(|d| d.id.as_str()).unwrap_or("-"),
            "Checkout completed"
        ),
        SagaStatus::Partial => tracing::warn!(
            subject_id = %subject_id,
            tenant_id = %tenant_id,
            failed_step = failed_step.unwrap_or("-"),
            sale_id = response.sale.as_ref().map(|s| s.id.as_str()).unwrap_or("-"),
            "Checkout partially applied"
        ),
    }

    Ok(Json(response))
}
