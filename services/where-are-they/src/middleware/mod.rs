pub mod ioc;
pub mod request_logging;

pub use ioc::{ioc_middleware, Inject};
pub use request_logging::request_logging_middleware;
