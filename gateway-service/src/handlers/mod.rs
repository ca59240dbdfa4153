pub mod auth;
pub mod checkout;
pub mod clients;
pub mod company;
pub mod debts;
pub mod health;
pub mod sales;

use axum::http::HeaderMap;
use service_core::error::AppError;

/// Header naming the branch a sale is recorded in, when the body does not.
pub const BRANCH_ID_HEADER: &str = "branch_id";

pub(crate) fn branch_from_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get(BRANCH_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Branch from the body, falling back to the `branch_id` header.
pub(crate) fn resolve_branch(body: Option<&str>, headers: &HeaderMap) -> Result<String, AppError> {
    body.map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .or_else(|| branch_from_header(headers))
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("branch_id is required")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn body_branch_wins_over_header() {
        let mut headers = HeaderMap::new();
        headers.insert(BRANCH_ID_HEADER, HeaderValue::from_static("from-header"));
        assert_eq!(resolve_branch(Some("from-body"), &headers).unwrap(), "from-body");
        assert_eq!(resolve_branch(Some(" "), &headers).unwrap(), "from-header");
    }

    #[test]
    fn missing_branch_is_bad_request() {
        let err = resolve_branch(None, &HeaderMap::new()).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
