pub mod filters;
pub mod movie;
pub mod runtime;

pub use filters::{validate_filters, Filters, Metadata};
pub use movie::{validate_movie, Movie, MovieInput, MovieUpdate};
pub use runtime::Runtime;

/// Sortable columns for the movies resource, in both directions.
pub const MOVIE_SORT_SAFELIST: &[&str] = &[
    "id", "title", "year", "runtime", "-id", "-title", "-year", "-runtime",
];
