use axum::{
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::dtos::ErrorResponse;

/// JSON body that must parse (400) and then pass validation (422).
pub struct ValidatedJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + 'static,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|e| {
            let err_resp = ErrorResponse {
                error: format!("Json parse error: {}", e.body_text()),
                reason: Some("malformed_body".to_string()),
            };
            (StatusCode::BAD_REQUEST, Json(err_resp)).into_response()
        })?;

        value.validate().map_err(|e| {
            let err_resp = ErrorResponse {
                error: format!("Validation error: {}", e),
                reason: Some("validation_failed".to_string()),
            };
            (StatusCode::UNPROCESSABLE_ENTITY, Json(err_resp)).into_response()
        })?;

        Ok(ValidatedJson(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtos::auth::LoginRequest;
    use axum::body::Body;

    fn json_request(body: &str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn unparseable_body_is_bad_request() {
        let result = ValidatedJson::<LoginRequest>::from_request(json_request("{not json"), &()).await;
        let response = result.err().unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn invalid_fields_are_unprocessable() {
        let result = ValidatedJson::<LoginRequest>::from_request(
            json_request(r#"{"phone_number": "", "password": "x"}"#),
            &(),
        )
        .await;
        let response = result.err().unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn valid_body_passes() {
        let result = ValidatedJson::<LoginRequest>::from_request(
            json_request(r#"{"phone_number": "+998900000000", "password": "secret"}"#),
            &(),
        )
        .await;
        assert!(result.is_ok());
    }
}
