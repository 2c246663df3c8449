pub mod api_error;
pub mod domain_error;

pub use api_error::{ApiError, ErrorResponse};
pub use domain_error::DomainError;
