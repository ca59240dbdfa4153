//! Conversion from downstream `tonic::Status` into `AppError`.
//!
//! | gRPC Status | AppError |
//! |-------------|----------|
//! | `INVALID_ARGUMENT`, `FAILED_PRECONDITION`, `OUT_OF_RANGE` | `BadRequest` |
//! | `NOT_FOUND` | `NotFound` |
//! | `UNAUTHENTICATED` | `Unauthorized` |
//! | `PERMISSION_DENIED` | `Forbidden` |
//! | `ALREADY_EXISTS` | `Conflict` |
//! | `UNAVAILABLE` | `ServiceUnavailable` |
//! | `DEADLINE_EXCEEDED`, `CANCELLED` | `GatewayTimeout` |
//! | anything else | `InternalError` |

use tonic::{Code, Status};

use crate::error::AppError;

impl From<Status> for AppError {
    fn from(status: Status) -> Self {
        match status.code() {
            Code::InvalidArgument | Code::FailedPrecondition | Code::OutOfRange => {
                AppError::BadRequest(anyhow::anyhow!("{}", status.message()))
            }
            Code::NotFound => AppError::NotFound(anyhow::anyhow!("{}", status.message())),
            Code::Unauthenticated => {
                AppError::Unauthorized(anyhow::anyhow!("{}", status.message()))
            }
            Code::PermissionDenied => AppError::Forbidden(anyhow::anyhow!("{}", status.message())),
            Code::AlreadyExists => AppError::Conflict(anyhow::anyhow!("{}", status.message())),
            Code::Unavailable => AppError::ServiceUnavailable,
            Code::DeadlineExceeded | Code::Cancelled => {
                AppError::GatewayTimeout(status.message().to_string())
            }
            Code::Unimplemented => {
                AppError::InternalError(anyhow::anyhow!("Not implemented: {}", status.message()))
            }
            _ => AppError::InternalError(anyhow::anyhow!("{}", status.message())),
        }
    }
}

/// Short machine-readable name for a status code, used in structured responses.
pub fn code_name(code: Code) -> &'static str {
    match code {
        Code::Ok => "ok",
        Code::Cancelled => "cancelled",
        Code::Unknown => "unknown",
        Code::InvalidArgument => "invalid_argument",
        Code::DeadlineExceeded => "deadline_exceeded",
        Code::NotFound => "not_found",
        Code::AlreadyExists => "already_exists",
        Code::PermissionDenied => "permission_denied",
        Code::ResourceExhausted => "resource_exhausted",
        Code::FailedPrecondition => "failed_precondition",
        Code::Aborted => "aborted",
        Code::OutOfRange => "out_of_range",
        Code::Unimplemented => "unimplemented",
        Code::Internal => "internal",
        Code::Unavailable => "unavailable",
        Code::DataLoss => "data_loss",
        Code::Unauthenticated => "unauthenticated",
    }
}
