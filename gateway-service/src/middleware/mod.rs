pub mod admission;
pub mod auth;
pub mod scope;

pub use admission::{admission_middleware, AdmissionRejection};
pub use auth::{authenticate, extract_token, RequestContext};
pub use scope::{request_deadline, AnonymousScope, CallScope, REQUEST_TIMEOUT_HEADER};
