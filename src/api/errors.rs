use std::collections::HashMap;
use std::fmt::Display;

use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use serde_json::{json, Value};

use crate::api::envelope::{write_json, Envelope};
use crate::store::StoreError;

/// Log an error together with the request method and URI. Full detail goes
/// to the server log only; clients never see it.
pub fn log_error(method: &Method, uri: &Uri, err: &dyn Display) {
    log::error!("{err} method={method} uri={uri}");
}

/// Wrap a message in an `error` envelope and write it with the given
/// status. If even that fails, fall back to an empty 500.
fn error_response(status: StatusCode, message: Value) -> Response {
    let envelope = Envelope::new("error", message);
    match write_json(status, &envelope, None) {
        Ok(response) => response,
        Err(err) => {
            log::error!("{err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub fn server_error_response(method: &Method, uri: &Uri, err: &dyn Display) -> Response {
    log_error(method, uri, err);
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!("the server encountered a problem and could not process your request"),
    )
}

/// Generic 500 for recovered panics, where no request context is
/// available; the panic detail has already been logged by the caller.
pub fn panic_response() -> Response {
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!("the server encountered a problem and could not process your request"),
    )
}

pub fn not_found_response() -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        json!("the requested resource could not be found"),
    )
}

pub fn method_not_allowed_response(method: &Method) -> Response {
    error_response(
        StatusCode::METHOD_NOT_ALLOWED,
        json!(format!(
            "the {method} method is not supported for this resource"
        )),
    )
}

pub fn bad_request_response(err: &dyn Display) -> Response {
    error_response(StatusCode::BAD_REQUEST, json!(err.to_string()))
}

pub fn failed_validation_response(errors: HashMap<String, String>) -> Response {
    error_response(StatusCode::UNPROCESSABLE_ENTITY, json!(errors))
}

pub fn edit_conflict_response() -> Response {
    error_response(
        StatusCode::CONFLICT,
        json!("unable to update the record due to an edit conflict, please try again"),
    )
}

/// Translate a store failure into the matching HTTP response. Missing
/// records are indistinguishable from unroutable ids at this layer.
pub fn store_error_response(method: &Method, uri: &Uri, err: StoreError) -> Response {
    match err {
        StoreError::RecordNotFound => not_found_response(),
        StoreError::EditConflict => edit_conflict_response(),
        err => server_error_response(method, uri, &err),
    }
}
