use std::collections::HashSet;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::model::Runtime;
use crate::validator::Validator;

/// A movie record. Owned by the data-access layer; handlers hold transient
/// copies for the duration of a request. `version` is the
/// optimistic-concurrency token, incremented by the store on every
/// successful update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Movie {
    pub id: i64,
    #[serde(skip_serializing)]
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub year: i32,
    pub runtime: Runtime,
    pub genres: Vec<String>,
    pub version: i32,
}

/// Decode target for POST /v1/movies. Every field is required, but that is
/// enforced by validation rather than by serde so missing fields come back
/// as named validation errors instead of opaque decode failures.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MovieInput {
    pub title: Option<String>,
    pub year: Option<i32>,
    pub runtime: Option<Runtime>,
    pub genres: Option<Vec<String>>,
}

/// Decode target for PATCH /v1/movies/:id. Absent fields leave the stored
/// record untouched.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MovieUpdate {
    pub title: Option<String>,
    pub year: Option<i32>,
    pub runtime: Option<Runtime>,
    pub genres: Option<Vec<String>>,
}

pub fn validate_movie(v: &mut Validator, movie: &Movie) {
    v.check(!movie.title.is_empty(), "title", "must be provided");
    v.check(
        movie.title.len() <= 500,
        "title",
        "must not be more than 500 bytes long",
    );

    v.check(movie.year != 0, "year", "must be provided");
    v.check(movie.year >= 1888, "year", "must be greater than 1888");
    v.check(
        movie.year <= Utc::now().year(),
        "year",
        "must not be in the future",
    );

    v.check(movie.runtime.minutes() != 0, "runtime", "must be provided");
    v.check(
        movie.runtime.minutes() > 0,
        "runtime",
        "must be a positive integer",
    );

    v.check(!movie.genres.is_empty(), "genres", "must be provided");
    v.check(
        !movie.genres.is_empty(),
        "genres",
        "must contain at least 1 genre",
    );
    v.check(
        movie.genres.len() <= 5,
        "genres",
        "must not contain more than 5 genres",
    );
    let unique: HashSet<&String> = movie.genres.iter().collect();
    v.check(
        unique.len() == movie.genres.len(),
        "genres",
        "must not contain duplicate values",
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_movie() -> Movie {
        Movie {
            id: 0,
            created_at: Utc::now(),
            title: "Casablanca".to_string(),
            year: 1942,
            runtime: Runtime(102),
            genres: vec!["drama".to_string(), "romance".to_string(), "war".to_string()],
            version: 1,
        }
    }

    #[test]
    fn valid_movie_passes() {
        let mut v = Validator::new();
        validate_movie(&mut v, &valid_movie());
        assert!(v.valid(), "unexpected errors: {:?}", v.errors);
    }

    #[test]
    fn missing_fields_are_named() {
        let mut v = Validator::new();
        let movie = Movie {
            title: String::new(),
            year: 0,
            runtime: Runtime(0),
            genres: vec![],
            ..valid_movie()
        };
        validate_movie(&mut v, &movie);
        for key in ["title", "year", "runtime", "genres"] {
            assert_eq!(v.errors[key], "must be provided");
        }
    }

    #[test]
    fn year_bounds() {
        let mut v = Validator::new();
        validate_movie(&mut v, &Movie { year: 1887, ..valid_movie() });
        assert_eq!(v.errors["year"], "must be greater than 1888");

        let mut v = Validator::new();
        validate_movie(&mut v, &Movie { year: Utc::now().year() + 1, ..valid_movie() });
        assert_eq!(v.errors["year"], "must not be in the future");
    }

    #[test]
    fn runtime_must_be_positive() {
        let mut v = Validator::new();
        validate_movie(&mut v, &Movie { runtime: Runtime(-5), ..valid_movie() });
        assert_eq!(v.errors["runtime"], "must be a positive integer");
    }

    #[test]
    fn genres_rules() {
        let mut v = Validator::new();
        let genres = vec!["a", "b", "c", "d", "e", "f"]
            .into_iter()
            .map(String::from)
            .collect();
        validate_movie(&mut v, &Movie { genres, ..valid_movie() });
        assert_eq!(v.errors["genres"], "must not contain more than 5 genres");

        let mut v = Validator::new();
        let genres = vec!["drama".to_string(), "drama".to_string()];
        validate_movie(&mut v, &Movie { genres, ..valid_movie() });
        assert_eq!(v.errors["genres"], "must not contain duplicate values");
    }

    #[test]
    fn created_at_is_not_serialized() {
        let value = serde_json::to_value(valid_movie()).unwrap();
        assert!(value.get("created_at").is_none());
        assert_eq!(value["runtime"], "102 mins");
    }
}
