mod logs;
mod metrics;
mod otel;
mod tracer;

pub use self::logs::init_logger;
pub use self::metrics::{Method, Metrics, Status};
pub use self::otel::{Telemetry, TracingContext};
pub use self::tracer::OperationTracer;
