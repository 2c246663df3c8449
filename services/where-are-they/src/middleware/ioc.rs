use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};

use crate::errors::ApiError;
use crate::ioc::Injector;
use crate::state::AppState;

/// Attaches a freshly built injector to the request.
pub async fn ioc_middleware(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let injector = Arc::new(state.request_injector());
    req.extensions_mut().insert(injector);
    next.run(req).await
}

/// Extractor resolving `T` from the request's injector.
///
/// ```ignore
/// async fn get_child(Inject(children): Inject<ChildService>, ApiPath(id): ApiPath<i64>) { .. }
/// ```
pub struct Inject<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for Inject<T>
where
    S: Send + Sync,
    T: Send + 'static,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let injector = parts.extensions.get::<Arc<Injector>>().ok_or_else(|| {
            tracing::error!("No injector on request; is ioc_middleware installed?");
            ApiError::internal("internal server error")
        })?;

        Ok(Inject(injector.get_instance::<T>()?))
    }
}
