//! gRPC plumbing for the gateway's downstream services.
//!
//! - Clients for the user, product, company and debt services
//! - Outbound metadata (tenant, request id, deadline, trace context)
//! - Deadline-aware retries
//! - `tonic::Status` to `AppError` conversion

pub mod company_client;
pub mod debt_client;
pub mod error;
pub mod interceptors;
pub mod product_client;
pub mod retry;
pub mod user_client;

// Generated client stubs and messages
pub mod proto {
    pub mod user {
        tonic::include_proto!("crm.user.v1");
    }
    pub mod product {
        tonic::include_proto!("crm.product.v1");
    }
    pub mod company {
        tonic::include_proto!("crm.company.v1");
    }
    pub mod debt {
        tonic::include_proto!("crm.debt.v1");
    }
}

pub use company_client::{CompanyClient, CompanyClientConfig};
pub use debt_client::{DebtClient, DebtClientConfig};
pub use error::code_name;
pub use interceptors::{
    COMPANY_ID_KEY, CallContext, REQUEST_ID_KEY, inject_call_context, inject_trace_context,
    scoped_request,
};
pub use product_client::{ProductClient, ProductClientConfig};
pub use retry::{RetryConfig, is_retryable, retry_grpc_call};
pub use user_client::{UserClient, UserClientConfig};

// Re-export commonly used tonic types
pub use tonic::{Code, Request, Response, Status};
