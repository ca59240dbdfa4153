pub mod logging;
pub mod metrics;

pub use logging::{TracingError, init_tracing};
pub use metrics::{get_metrics, init_metrics};
