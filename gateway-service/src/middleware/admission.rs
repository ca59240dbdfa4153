//! Admission gate for every protected route.
//!
//! A request moves `Start -> Authenticated -> Authorized -> Admitted`. It is
//! rejected from `Start` when its credential is unusable and from
//! `Authenticated` when the policy denies it or cannot be consulted. Only an
//! admitted request reaches a handler, with its [`RequestContext`] attached.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use metrics::counter;
use thiserror::Error;

use super::auth::{authenticate, RequestContext};
use crate::dtos::ErrorResponse;
use crate::services::{Claims, TokenError};
use crate::AppState;

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum AdmissionRejection {
    #[error("missing credentials")]
    CredentialMissing,
    #[error("malformed credentials")]
    CredentialMalformed,
    #[error("credentials expired")]
    CredentialExpired,
    #[error("wrong token kind")]
    CredentialWrongKind,
    #[error("permission denied")]
    PolicyDenied,
    #[error("policy store unavailable")]
    PolicyStoreUnavailable,
}

impl AdmissionRejection {
    /// Category returned to the client in the `reason` field.
    pub fn reason(&self) -> &'static str {
        match self {
            AdmissionRejection::CredentialMissing
            | AdmissionRejection::CredentialMalformed
            | AdmissionRejection::CredentialExpired
            | AdmissionRejection::CredentialWrongKind => "unauthenticated",
            AdmissionRejection::PolicyDenied => "forbidden",
            AdmissionRejection::PolicyStoreUnavailable => "policy_unavailable",
        }
    }

    /// Finer-grained label for logs.
    pub fn detail(&self) -> &'static str {
        match self {
            AdmissionRejection::CredentialMissing => "credential_missing",
            AdmissionRejection::CredentialMalformed => "credential_malformed",
            AdmissionRejection::CredentialExpired => "credential_expired",
            AdmissionRejection::CredentialWrongKind => "credential_wrong_kind",
            AdmissionRejection::PolicyDenied => "policy_denied",
            AdmissionRejection::PolicyStoreUnavailable => "policy_store_unavailable",
        }
    }

    /// Policy denials are 401, not 403.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AdmissionRejection::PolicyStoreUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

impl From<TokenError> for AdmissionRejection {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => AdmissionRejection::CredentialExpired,
            TokenError::WrongKind => AdmissionRejection::CredentialWrongKind,
            TokenError::Malformed | TokenError::Signing(_) | TokenError::MissingClaim(_) => {
                AdmissionRejection::CredentialMalformed
            }
        }
    }
}

impl IntoResponse for AdmissionRejection {
    fn into_response(self) -> Response {
        (
            self.status_code(),
            Json(ErrorResponse {
                error: self.to_string(),
                reason: Some(self.reason().to_string()),
            }),
        )
            .into_response()
    }
}

pub async fn admission_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let method = req.method().as_str().to_string();
    let path = req.uri().path().to_string();

    let claims = match authenticate(req.headers(), &state.tokens) {
        Ok(claims) => claims,
        Err(rejection) => return reject(rejection, None, &method, &path),
    };

    match state.policy.authorize(&claims.role, &path, &method).await {
        Ok(true) => {}
        Ok(false) => {
            return reject(AdmissionRejection::PolicyDenied, Some(&claims), &method, &path);
        }
        Err(err) => {
            tracing::error!(error = %err, role = %claims.role, "Policy engine failed");
            return reject(
                AdmissionRejection::PolicyStoreUnavailable,
                Some(&claims),
                &method,
                &path,
            );
        }
    }

    counter!("gateway_admission_total", "outcome" => "admitted").increment(1);
    tracing::debug!(
        subject_id = %claims.subject_id,
        tenant_id = %claims.tenant_id,
        role = %claims.role,
        method = %method,
        path = %path,
        "Request admitted"
    );

    req.extensions_mut().insert(RequestContext::from(claims));
    next.run(req).await
}

fn reject(
    rejection: AdmissionRejection,
    claims: Option<&Claims>,
    method: &str,
    path: &str,
) -> Response {
    let subject_id = claims.map(|c| c.subject_id.as_str()).unwrap_or("-");

    if rejection == AdmissionRejection::PolicyStoreUnavailable {
        tracing::error!(
            subject_id,
            method,
            path,
            reason = rejection.detail(),
            "Request rejected"
        );
    } else {
        tracing::warn!(
            subject_id,
            method,
            path,
            reason = rejection.detail(),
            "Request rejected"
        );
    }

    counter!("gateway_admission_total", "outcome" => rejection.reason()).increment(1);
    rejection.into_response()
}
