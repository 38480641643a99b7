use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use axum::http::Method;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::timeout::TimeoutLayer;

use crate::api::errors::{method_not_allowed_response, not_found_response};
use crate::api::handlers::{self, AppState};
use crate::store::MovieStore;

/// Ceiling for handling a single request, reading its body included.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Build the route table. Unmatched paths get the 404 responder, matched
/// paths with an unsupported method get the 405 responder, and a panicking
/// handler is logged and converted into a 500 instead of dropping the
/// connection.
pub fn create_router<S: MovieStore + 'static>() -> Router<Arc<AppState<S>>> {
    Router::new()
        .route(
            "/v1/healthcheck",
            get(handlers::healthcheck::<S>).fallback(method_not_allowed),
        )
        .route(
            "/v1/movies",
            get(handlers::list_movies::<S>)
                .post(handlers::create_movie::<S>)
                .fallback(method_not_allowed),
        )
        .route(
            "/v1/movies/:id",
            get(handlers::show_movie::<S>)
                .patch(handlers::update_movie::<S>)
                .delete(handlers::delete_movie::<S>)
                .fallback(method_not_allowed),
        )
        .fallback(not_found)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
}

async fn not_found() -> Response {
    not_found_response()
}

async fn method_not_allowed(method: Method) -> Response {
    method_not_allowed_response(&method)
}

/// Last line of defense: any panic escaping a handler becomes a generic
/// 500 rather than a dropped connection.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic payload"
    };
    log::error!("panic while handling request: {detail}");

    crate::api::errors::panic_response()
}
