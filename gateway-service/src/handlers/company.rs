use axum::{
    extract::{Query, State},
    Json,
};
use service_core::error::AppError;
use service_core::grpc::proto::company::{BranchFilter, BranchList, Company};

use crate::middleware::CallScope;
use crate::AppState;

/// The caller's own company.
pub async fn get_company(
    State(state): State<AppState>,
    scope: CallScope,
) -> Result<Json<Company>, AppError> {
    Ok(Json(state.companies.get_company(&scope.call).await?))
}

pub async fn list_branches(
    State(state): State<AppState>,
    scope: CallScope,
    Query(mut filter): Query<BranchFilter>,
) -> Result<Json<BranchList>, AppError> {
    filter.company_id = scope.call.tenant_id.clone();
    Ok(Json(state.companies.list_branches(&scope.call, filter).await?))
}
