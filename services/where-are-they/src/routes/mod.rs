use std::time::Duration;

use axum::{
    error_handling::HandleErrorLayer,
    http::{header, StatusCode, Uri},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    BoxError, Router,
};
use tower::{timeout::error::Elapsed, ServiceBuilder};

use crate::errors::ApiError;
use crate::handlers::{
    add_observed_user, create_address, create_child, create_observed_user, create_observer_user,
    create_school_bus, delete_address, delete_child, delete_school_bus, get_address, get_child,
    get_school_bus, get_user, health_check, login, ping, update_address, update_child,
    update_school_bus,
};
use crate::middleware::{ioc_middleware, request_logging_middleware};
use crate::state::AppState;

/// Prefix every entity route is served under.
pub const API_PREFIX: &str = "/where/are/they";

/// Create the main application router with all routes
pub fn create_router(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config.request_timeout_secs);

    let api = Router::new()
        // Users
        .route("/users/login", post(login))
        .route("/users/observed", post(create_observed_user))
        .route("/users/observer", post(create_observer_user))
        .route("/users/observer/:id/observed", post(add_observed_user))
        .route("/users/:id", get(get_user))
        // School buses
        .route("/school-bus", post(create_school_bus))
        .route(
            "/school-bus/:id",
            get(get_school_bus)
                .put(update_school_bus)
                .delete(delete_school_bus),
        )
        // Addresses
        .route("/addresses", post(create_address).put(update_address))
        .route("/addresses/:id", get(get_address).delete(delete_address))
        // Children
        .route("/children", post(create_child).put(update_child))
        .route("/children/:id", get(get_child).delete(delete_child))
        // Every entity handler resolves its use-case from the request injector
        .layer(middleware::from_fn_with_state(state.clone(), ioc_middleware));

    Router::new()
        .route("/health", get(health_check))
        .route("/ping", get(ping))
        .nest(API_PREFIX, api)
        .fallback(route_not_found)
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_middleware_error))
                .timeout(timeout),
        )
        .layer(middleware::map_response(method_not_allowed_envelope))
        .layer(middleware::from_fn(request_logging_middleware))
        .with_state(state)
}

async fn route_not_found(uri: Uri) -> ApiError {
    ApiError::not_found(format!("no route for {}", uri.path()))
}

async fn handle_middleware_error(err: BoxError) -> ApiError {
    if err.is::<Elapsed>() {
        tracing::warn!("Request abandoned after timeout");
        ApiError::request_timeout("request took too long")
    } else {
        tracing::error!("Unhandled middleware error: {}", err);
        ApiError::internal("internal server error")
    }
}

/// axum answers a known path with an unrouted method by an empty 405; give
/// it the error envelope and keep the `Allow` header.
async fn method_not_allowed_envelope(response: Response) -> Response {
    if response.status() != StatusCode::METHOD_NOT_ALLOWED {
        return response;
    }

    let allow = response.headers().get(header::ALLOW).cloned();
    let mut enveloped = ApiError::method_not_allowed("method not allowed for this route").into_response();
    if let Some(allow) = allow {
        enveloped.headers_mut().insert(header::ALLOW, allow);
    }
    enveloped
}
