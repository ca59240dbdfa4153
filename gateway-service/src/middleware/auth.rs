use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use serde::Serialize;
use service_core::error::AppError;

use super::admission::AdmissionRejection;
use crate::services::{Claims, TokenCodec, TokenKind};

/// Caller identity attached to a request once it has been admitted.
///
/// Serialized names match the token claims and the metadata keys sent to
/// downstream services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestContext {
    #[serde(rename = "id")]
    pub subject_id: String,
    pub role: String,
    #[serde(rename = "company_id")]
    pub tenant_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
}

impl From<Claims> for RequestContext {
    fn from(claims: Claims) -> Self {
        Self {
            subject_id: claims.subject_id,
            role: claims.role,
            tenant_id: claims.tenant_id,
            display_name: claims.display_name,
            contact: claims.contact,
        }
    }
}

/// Read the credential from `Authorization`. Both `Bearer <token>` and a bare
/// token are accepted. `Ok(None)` when the header is absent or blank.
pub fn extract_token(headers: &HeaderMap) -> Result<Option<&str>, AdmissionRejection> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let value = value
        .to_str()
        .map_err(|_| AdmissionRejection::CredentialMalformed)?
        .trim();

    let token = match value.split_once(' ') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        _ => value,
    };

    if token.is_empty() {
        Ok(None)
    } else {
        Ok(Some(token))
    }
}

/// Verify the request's access token and return its claims.
pub fn authenticate(headers: &HeaderMap, codec: &TokenCodec) -> Result<Claims, AdmissionRejection> {
    let token = extract_token(headers)?.ok_or(AdmissionRejection::CredentialMissing)?;
    codec
        .verify(token, TokenKind::Access)
        .map_err(AdmissionRejection::from)
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .ok_or_else(|| {
                AppError::InternalError(anyhow::anyhow!(
                    "request context missing from request extensions"
                ))
            })
    }
}
