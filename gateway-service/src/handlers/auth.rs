//! Login and refresh. Both run before anyone is admitted.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use service_core::error::AppError;
use service_core::grpc::proto::user::{LogInRequest, UserIdentity};
use service_core::grpc::{Code, Status};

use crate::dtos::auth::{
    AccessTokenResponse, LoginRequest, RefreshRequest, TokenPairResponse, UserSummary,
};
use crate::dtos::ErrorResponse;
use crate::middleware::AnonymousScope;
use crate::services::{Identity, TokenError, TokenKind};
use crate::utils::ValidatedJson;
use crate::AppState;

const TOKEN_TYPE: &str = "Bearer";

fn unauthorized(error: &str, reason: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            error: error.to_string(),
            reason: Some(reason.to_string()),
        }),
    )
        .into_response()
}

fn identity_of(user: &UserIdentity) -> Identity {
    let optional = |s: &str| (!s.is_empty()).then(|| s.to_string());
    Identity {
        subject_id: user.id.clone(),
        role: user.role.clone(),
        tenant_id: user.company_id.clone(),
        display_name: optional(&user.first_name),
        contact: optional(&user.phone_number),
    }
}

fn login_failure(status: Status) -> Response {
    match status.code() {
        Code::NotFound | Code::Unauthenticated | Code::InvalidArgument => {
            tracing::warn!(code = ?status.code(), "Login rejected by user service");
            unauthorized("invalid credentials", "invalid_credentials")
        }
        _ => {
            tracing::error!(code = ?status.code(), error = %status.message(), "Login failed");
            AppError::from(status).into_response()
        }
    }
}

pub async fn login(
    State(state): State<AppState>,
    AnonymousScope(call): AnonymousScope,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Json<TokenPairResponse>, Response> {
    let user = state
        .users
        .log_in(
            &call,
            LogInRequest {
                phone_number: req.phone_number,
                password: req.password,
            },
        )
        .await
        .map_err(login_failure)?;

    let identity = identity_of(&user);
    if let Some(claim) = identity.missing_claim() {
        tracing::warn!(
            subject_id = %identity.subject_id,
            claim,
            "User service returned an incomplete identity"
        );
        return Err(unauthorized("account is not bound to a company", "incomplete_identity"));
    }

    let access = state
        .tokens
        .issue_access_token(&identity)
        .map_err(signing_failure)?;
    let refresh = state
        .tokens
        .issue_refresh_token(&identity)
        .map_err(signing_failure)?;

    tracing::info!(
        subject_id = %identity.subject_id,
        tenant_id = %identity.tenant_id,
        role = %identity.role,
        "User logged in"
    );

    Ok(Json(TokenPairResponse {
        expires_in: access.expires_in(),
        access_token: access.token,
        refresh_token: refresh.token,
        token_type: TOKEN_TYPE.to_string(),
        user: UserSummary {
            id: user.id,
            first_name: user.first_name,
            role: user.role,
            company_id: user.company_id,
        },
    }))
}

pub async fn refresh(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RefreshRequest>,
) -> Result<Json<AccessTokenResponse>, Response> {
    let claims = state
        .tokens
        .verify(&req.refresh_token, TokenKind::Refresh)
        .map_err(|err| match err {
            TokenError::Expired => unauthorized("session expired", "session_expired"),
            TokenError::WrongKind => {
                tracing::warn!("Access token presented to the refresh endpoint");
                unauthorized("wrong token kind", "wrong_token_kind")
            }
            TokenError::Malformed | TokenError::Signing(_) | TokenError::MissingClaim(_) => {
                unauthorized("invalid token", "invalid_token")
            }
        })?;

    let access = state
        .tokens
        .issue_access_token(&claims.identity())
        .map_err(signing_failure)?;

    tracing::debug!(subject_id = %claims.subject_id, "Access token refreshed");

    Ok(Json(AccessTokenResponse {
        expires_in: access.expires_in(),
        access_token: access.token,
        token_type: TOKEN_TYPE.to_string(),
    }))
}

fn signing_failure(err: TokenError) -> Response {
    tracing::error!(error = %err, "Token issuance failed");
    AppError::InternalError(anyhow::anyhow!("could not issue token")).into_response()
}
