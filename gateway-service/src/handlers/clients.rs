use axum::{
    extract::{Path, Query, State},
    Json,
};
use service_core::error::AppError;
use service_core::grpc::proto::user::{Client, ClientFilter, ClientIdRequest, ClientList};

use crate::middleware::CallScope;
use crate::AppState;

pub async fn list_clients(
    State(state): State<AppState>,
    scope: CallScope,
    Query(mut filter): Query<ClientFilter>,
) -> Result<Json<ClientList>, AppError> {
    filter.company_id = scope.call.tenant_id.clone();
    Ok(Json(state.users.list_clients(&scope.call, filter).await?))
}

pub async fn get_client(
    State(state): State<AppState>,
    scope: CallScope,
    Path(id): Path<String>,
) -> Result<Json<Client>, AppError> {
    let request = ClientIdRequest {
        id,
        company_id: scope.call.tenant_id.clone(),
    };
    Ok(Json(state.users.get_client(&scope.call, request).await?))
}
