use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;
use service_core::grpc::proto::debt::{
    Debt, DebtFilter, DebtIdRequest, DebtList, DebtRequest, PayDebtRequest, PayDebtResponse,
    PaymentFilter, PaymentList,
};

use crate::dtos::debt::{CreateDebtRequest, PayDebtBody};
use crate::middleware::CallScope;
use crate::utils::ValidatedJson;
use crate::AppState;

pub async fn create_debt(
    State(state): State<AppState>,
    scope: CallScope,
    ValidatedJson(req): ValidatedJson<CreateDebtRequest>,
) -> Result<(StatusCode, Json<Debt>), AppError> {
    let request = DebtRequest {
        client_id: req.client_id,
        total_amount: req.total_amount,
        currency_code: req.currency_code,
        company_id: scope.call.tenant_id.clone(),
    };
    let debt = state.debts.create_debt(&scope.call, request).await?;
    Ok((StatusCode::CREATED, Json(debt)))
}

pub async fn list_debts(
    State(state): State<AppState>,
    scope: CallScope,
    Query(mut filter): Query<DebtFilter>,
) -> Result<Json<DebtList>, AppError> {
    filter.company_id = scope.call.tenant_id.clone();
    Ok(Json(state.debts.list_debts(&scope.call, filter).await?))
}

pub async fn get_debt(
    State(state): State<AppState>,
    scope: CallScope,
    Path(id): Path<String>,
) -> Result<Json<Debt>, AppError> {
    let request = DebtIdRequest {
        id,
        company_id: scope.call.tenant_id.clone(),
    };
    Ok(Json(state.debts.get_debt(&scope.call, request).await?))
}

/// Pays against an existing debt; returns the payment and the updated balance.
pub async fn pay_debt(
    State(state): State<AppState>,
    scope: CallScope,
    ValidatedJson(req): ValidatedJson<PayDebtBody>,
) -> Result<Json<PayDebtResponse>, AppError> {
    let request = PayDebtRequest {
        debt_id: req.debt_id,
        paid_amount: req.paid_amount,
        company_id: scope.call.tenant_id.clone(),
        pay_type: req.pay_type,
    };
    let paid = state.debts.pay_debt(&scope.call, request).await?;

    tracing::info!(
        subject_id = %scope.caller.subject_id,
        debt_id = paid.debt.as_ref().map(|d| d.id.as_str()).unwrap_or("-"),
        "Debt payment recorded"
    );
    Ok(Json(paid))
}

pub async fn list_payments(
    State(state): State<AppState>,
    scope: CallScope,
    Path(debt_id): Path<String>,
) -> Result<Json<PaymentList>, AppError> {
    let request = PaymentFilter {
        debt_id,
        company_id: scope.call.tenant_id.clone(),
    };
    Ok(Json(state.debts.list_payments(&scope.call, request).await?))
}
