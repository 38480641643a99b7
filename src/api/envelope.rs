use axum::body::{to_bytes, Body, Bytes};
use axum::extract::Request;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::Response;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Maximum accepted request body size: 1 MiB.
pub const MAX_BODY_BYTES: usize = 1_048_576;

/// Single-key wrapper around a response payload, e.g. `{"movie": {...}}` or
/// `{"error": "..."}`. Exists only as a serialization wrapper.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope(Map<String, Value>);

impl Envelope {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        let mut map = Map::new();
        map.insert(key.into(), value);
        Envelope(map)
    }

    /// Add a sibling key, for responses that carry a payload plus metadata.
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.0.insert(key.into(), value);
        self
    }
}

/// Serialize an envelope as an indented JSON response with a trailing
/// newline. Extra headers are merged before the content-type header is set,
/// so callers cannot override the content type.
///
/// A serialization failure is returned before anything is written; callers
/// fall back to an empty 500 response.
pub fn write_json(
    status: StatusCode,
    envelope: &Envelope,
    headers: Option<HeaderMap>,
) -> Result<Response, serde_json::Error> {
    let mut buf = serde_json::to_vec_pretty(&envelope.0)?;
    buf.push(b'\n');

    let mut response = Response::new(Body::from(buf));
    *response.status_mut() = status;
    if let Some(extra) = headers {
        response.headers_mut().extend(extra);
    }
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    Ok(response)
}

/// User-facing decode failure categories for inbound request bodies. The
/// triage is a closed enumeration so each category stays exhaustively
/// matched and individually testable.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BodyError {
    #[error("body contains badly-formed JSON (at character {0})")]
    Syntax(usize),
    #[error("body contains badly JSON")]
    UnexpectedEof,
    #[error("body contains incorrect JSON type for field \"{0}\"")]
    IncorrectTypeField(String),
    #[error("body contains incorrect JSON type (at character {0})")]
    IncorrectType(usize),
    #[error("body must not be empty")]
    Empty,
    #[error("body contains unknown key \"{0}\"")]
    UnknownField(String),
    #[error("body must not be larger than {0} bytes")]
    TooLarge(usize),
    #[error("body must only contain a single JSON value")]
    MultipleValues,
    #[error("{0}")]
    Other(String),
}

/// Read a request body, capped at [`MAX_BODY_BYTES`], and decode it as
/// exactly one JSON value of type `T`.
pub async fn read_json_body<T: DeserializeOwned>(req: Request) -> Result<T, BodyError> {
    let body = read_body(req.into_body()).await?;
    read_json(&body)
}

async fn read_body(body: Body) -> Result<Bytes, BodyError> {
    to_bytes(body, MAX_BODY_BYTES).await.map_err(|err| {
        let mut source: Option<&(dyn std::error::Error + 'static)> = Some(&err);
        while let Some(cause) = source {
            if cause.is::<http_body_util::LengthLimitError>() {
                return BodyError::TooLarge(MAX_BODY_BYTES);
            }
            source = cause.source();
        }
        BodyError::Other(err.to_string())
    })
}

/// Decode a single JSON value from `body`, mapping any failure onto a
/// [`BodyError`]. The body must contain exactly one value: after the
/// primary decode the deserializer must see a clean end-of-stream.
pub fn read_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, BodyError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(BodyError::Empty);
    }

    let mut de = serde_json::Deserializer::from_slice(body);
    let value = serde_path_to_error::deserialize(&mut de).map_err(|err| classify(body, err))?;
    if de.end().is_err() {
        return Err(BodyError::MultipleValues);
    }
    Ok(value)
}

fn classify(body: &[u8], err: serde_path_to_error::Error<serde_json::Error>) -> BodyError {
    use serde_json::error::Category;

    // An empty path renders as ".".
    let path = err.path().to_string();
    let err = err.into_inner();
    match err.classify() {
        Category::Eof => BodyError::UnexpectedEof,
        Category::Syntax => BodyError::Syntax(character_offset(body, err.line(), err.column())),
        Category::Data => {
            let message = err.to_string();
            if let Some(field) = message
                .strip_prefix("unknown field `")
                .and_then(|rest| rest.split('`').next())
            {
                return BodyError::UnknownField(field.to_string());
            }
            if path != "." {
                return BodyError::IncorrectTypeField(path);
            }
            // A mismatch with no attributable field, e.g. a non-object at
            // the top level, falls back to the position.
            BodyError::IncorrectType(character_offset(body, err.line(), err.column()))
        }
        Category::Io => BodyError::Other(err.to_string()),
    }
}

/// Translate serde_json's 1-based line/column pair into an absolute
/// character position within the body.
fn character_offset(body: &[u8], line: usize, column: usize) -> usize {
    if line <= 1 {
        return column;
    }
    let mut offset = 0;
    let mut current_line = 1;
    for &b in body {
        offset += 1;
        if b == b'\n' {
            current_line += 1;
            if current_line == line {
                break;
            }
        }
    }
    offset + column
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(deny_unknown_fields)]
    struct Input {
        title: Option<String>,
        year: Option<i32>,
    }

    async fn body_text(response: Response) -> (StatusCode, HeaderMap, String) {
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, headers, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn write_json_round_trips_through_a_generic_parser() {
        let envelope = Envelope::new("movie", json!({"title": "Casablanca", "year": 1942}));
        let response = write_json(StatusCode::OK, &envelope, None).unwrap();
        let (status, headers, text) = body_text(response).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "application/json");
        assert!(text.ends_with('\n'));
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, json!({"movie": {"title": "Casablanca", "year": 1942}}));
    }

    #[tokio::test]
    async fn write_json_merges_extra_headers_but_protects_content_type() {
        let mut extra = HeaderMap::new();
        extra.insert(header::LOCATION, HeaderValue::from_static("/v1/movies/7"));
        extra.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));

        let envelope = Envelope::new("movie", json!({"id": 7}));
        let response = write_json(StatusCode::CREATED, &envelope, Some(extra)).unwrap();
        let (status, headers, _) = body_text(response).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(headers[header::LOCATION], "/v1/movies/7");
        assert_eq!(headers[header::CONTENT_TYPE], "application/json");
    }

    #[test]
    fn empty_body() {
        assert_eq!(read_json::<Input>(b"").unwrap_err(), BodyError::Empty);
        assert_eq!(read_json::<Input>(b"  \n ").unwrap_err(), BodyError::Empty);
    }

    #[test]
    fn badly_formed_json_reports_character_position() {
        let err = read_json::<Input>(b"{\"title\": ,}").unwrap_err();
        assert_eq!(err, BodyError::Syntax(11));
        assert_eq!(
            err.to_string(),
            "body contains badly-formed JSON (at character 11)"
        );
    }

    #[test]
    fn truncated_json_is_a_generic_syntax_error() {
        let err = read_json::<Input>(b"{\"title\": \"Casablanca\"").unwrap_err();
        assert_eq!(err, BodyError::UnexpectedEof);
        assert_eq!(err.to_string(), "body contains badly JSON");
    }

    #[test]
    fn type_mismatch_names_the_field() {
        let err = read_json::<Input>(b"{\"year\": \"abc\"}").unwrap_err();
        assert_eq!(err, BodyError::IncorrectTypeField("year".to_string()));
        assert_eq!(
            err.to_string(),
            "body contains incorrect JSON type for field \"year\""
        );
    }

    #[test]
    fn type_mismatch_without_a_field_reports_character_position() {
        // A non-object at the top level has no field to attribute.
        let err = read_json::<Input>(b"[]").unwrap_err();
        assert!(matches!(err, BodyError::IncorrectType(_)));
    }

    #[test]
    fn unknown_field_is_named() {
        let err = read_json::<Input>(b"{\"title\": \"Dune\", \"rating\": 5}").unwrap_err();
        assert_eq!(err, BodyError::UnknownField("rating".to_string()));
        assert_eq!(err.to_string(), "body contains unknown key \"rating\"");
    }

    #[test]
    fn two_concatenated_values_are_rejected() {
        let err = read_json::<Input>(b"{\"title\": \"Dune\"}{\"title\": \"Tron\"}").unwrap_err();
        assert_eq!(err, BodyError::MultipleValues);

        // The first value being valid makes no difference.
        let err = read_json::<Input>(b"{} []").unwrap_err();
        assert_eq!(err, BodyError::MultipleValues);
    }

    #[test]
    fn single_valid_value_decodes() {
        let input: Input = read_json(b"{\"title\": \"Dune\", \"year\": 2021}").unwrap();
        assert_eq!(
            input,
            Input {
                title: Some("Dune".to_string()),
                year: Some(2021),
            }
        );
    }

    #[tokio::test]
    async fn oversized_body_cites_the_byte_limit() {
        let oversized = vec![b' '; MAX_BODY_BYTES + 1];
        let err = read_body(Body::from(oversized)).await.unwrap_err();
        assert_eq!(err, BodyError::TooLarge(MAX_BODY_BYTES));
        assert_eq!(
            err.to_string(),
            "body must not be larger than 1048576 bytes"
        );
    }

    #[test]
    fn character_offset_spans_lines() {
        let body = b"{\n  \"title\": ,\n}";
        let err = read_json::<Input>(body).unwrap_err();
        // Byte 2 starts the second line; the offending comma is at column 12.
        assert_eq!(err, BodyError::Syntax(2 + 12));
    }
}
