use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, Request, State};
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri};
use axum::response::Response;
use chrono::Utc;
use serde_json::json;

use crate::api::envelope::{read_json_body, write_json, Envelope};
use crate::api::errors::{
    bad_request_response, failed_validation_response, not_found_response, server_error_response,
    store_error_response,
};
use crate::api::params::{read_csv, read_int, read_string};
use crate::config::AppConfig;
use crate::model::{
    validate_filters, validate_movie, Filters, Movie, MovieInput, MovieUpdate, Runtime,
    MOVIE_SORT_SAFELIST,
};
use crate::store::MovieStore;
use crate::validator::Validator;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Shared application context, constructed once at startup and handed to
/// every handler through the router state. No ambient globals.
#[derive(Debug)]
pub struct AppState<S> {
    pub config: AppConfig,
    pub store: S,
}

/// Parse a path identifier. Values below 1 and non-numeric values are
/// treated the same as an absent resource.
fn parse_id(raw: &str) -> Option<i64> {
    raw.parse::<i64>().ok().filter(|id| *id >= 1)
}

/// Serialize a payload into an envelope response, falling back to the
/// generic 500 if serialization fails.
fn payload_response(
    method: &Method,
    uri: &Uri,
    status: StatusCode,
    key: &str,
    payload: &impl serde::Serialize,
    headers: Option<HeaderMap>,
) -> Response {
    let result = serde_json::to_value(payload)
        .and_then(|value| write_json(status, &Envelope::new(key, value), headers));
    match result {
        Ok(response) => response,
        Err(err) => server_error_response(method, uri, &err),
    }
}

pub async fn healthcheck<S: MovieStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    method: Method,
    uri: Uri,
) -> Response {
    let envelope = Envelope::new("status", json!("available")).with(
        "system_info",
        json!({
            "environment": state.config.env,
            "version": VERSION,
        }),
    );
    match write_json(StatusCode::OK, &envelope, None) {
        Ok(response) => response,
        Err(err) => server_error_response(&method, &uri, &err),
    }
}

pub async fn create_movie<S: MovieStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    method: Method,
    uri: Uri,
    req: Request,
) -> Response {
    let input: MovieInput = match read_json_body(req).await {
        Ok(input) => input,
        Err(err) => return bad_request_response(&err),
    };

    let mut movie = Movie {
        id: 0,
        created_at: Utc::now(),
        title: input.title.unwrap_or_default(),
        year: input.year.unwrap_or_default(),
        runtime: input.runtime.unwrap_or(Runtime(0)),
        genres: input.genres.unwrap_or_default(),
        version: 1,
    };

    let mut v = Validator::new();
    validate_movie(&mut v, &movie);
    if !v.valid() {
        return failed_validation_response(v.errors);
    }

    if let Err(err) = state.store.insert(&mut movie).await {
        return store_error_response(&method, &uri, err);
    }

    // Point the client at the newly minted resource.
    let mut headers = HeaderMap::new();
    if let Ok(location) = HeaderValue::from_str(&format!("/v1/movies/{}", movie.id)) {
        headers.insert(header::LOCATION, location);
    }

    payload_response(
        &method,
        &uri,
        StatusCode::CREATED,
        "movie",
        &movie,
        Some(headers),
    )
}

pub async fn show_movie<S: MovieStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    method: Method,
    uri: Uri,
    Path(id): Path<String>,
) -> Response {
    let Some(id) = parse_id(&id) else {
        return not_found_response();
    };

    match state.store.get(id).await {
        Ok(movie) => payload_response(&method, &uri, StatusCode::OK, "movie", &movie, None),
        Err(err) => store_error_response(&method, &uri, err),
    }
}

pub async fn update_movie<S: MovieStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    method: Method,
    uri: Uri,
    Path(id): Path<String>,
    req: Request,
) -> Response {
    let Some(id) = parse_id(&id) else {
        return not_found_response();
    };

    let mut movie = match state.store.get(id).await {
        Ok(movie) => movie,
        Err(err) => return store_error_response(&method, &uri, err),
    };

    let update: MovieUpdate = match read_json_body(req).await {
        Ok(update) => update,
        Err(err) => return bad_request_response(&err),
    };

    // Absent fields leave the stored values untouched.
    if let Some(title) = update.title {
        movie.title = title;
    }
    if let Some(year) = update.year {
        movie.year = year;
    }
    if let Some(runtime) = update.runtime {
        movie.runtime = runtime;
    }
    if let Some(genres) = update.genres {
        movie.genres = genres;
    }

    let mut v = Validator::new();
    validate_movie(&mut v, &movie);
    if !v.valid() {
        return failed_validation_response(v.errors);
    }

    if let Err(err) = state.store.update(&mut movie).await {
        return store_error_response(&method, &uri, err);
    }

    payload_response(&method, &uri, StatusCode::OK, "movie", &movie, None)
}

pub async fn delete_movie<S: MovieStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    method: Method,
    uri: Uri,
    Path(id): Path<String>,
) -> Response {
    let Some(id) = parse_id(&id) else {
        return not_found_response();
    };

    if let Err(err) = state.store.delete(id).await {
        return store_error_response(&method, &uri, err);
    }

    let envelope = Envelope::new("message", json!("movie successfully deleted"));
    match write_json(StatusCode::OK, &envelope, None) {
        Ok(response) => response,
        Err(err) => server_error_response(&method, &uri, &err),
    }
}

pub async fn list_movies<S: MovieStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    method: Method,
    uri: Uri,
    Query(qs): Query<HashMap<String, String>>,
) -> Response {
    let mut v = Validator::new();

    let title = read_string(&qs, "title", "");
    let genres = read_csv(&qs, "genres", vec![]);
    let filters = Filters {
        page: read_int(&qs, "page", 1, &mut v),
        page_size: read_int(&qs, "page_size", 20, &mut v),
        sort: read_string(&qs, "sort", "id"),
        sort_safelist: MOVIE_SORT_SAFELIST,
    };

    validate_filters(&mut v, &filters);
    if !v.valid() {
        return failed_validation_response(v.errors);
    }

    let (movies, metadata) = match state.store.list(&title, &genres, &filters).await {
        Ok(page) => page,
        Err(err) => return store_error_response(&method, &uri, err),
    };

    let result = serde_json::to_value(&movies).and_then(|movies_value| {
        let metadata_value = serde_json::to_value(&metadata)?;
        write_json(
            StatusCode::OK,
            &Envelope::new("movies", movies_value).with("metadata", metadata_value),
            None,
        )
    });
    match result {
        Ok(response) => response,
        Err(err) => server_error_response(&method, &uri, &err),
    }
}
