pub mod auth;
pub mod config;
pub mod domain;
pub mod errors;
pub mod gateways;
pub mod handlers;
pub mod ioc;
pub mod middleware;
pub mod repo;
pub mod routes;
pub mod services;
pub mod state;

pub use config::Config;
pub use errors::{ApiError, DomainError};
pub use ioc::Injector;
pub use state::{AppState, Gateways};
