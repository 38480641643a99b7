use thiserror::Error;

use crate::model::{Filters, Metadata, Movie};

/// Failure signals from the data-access layer that handlers branch on.
/// Anything else is a database fault surfaced as a 500.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    RecordNotFound,
    #[error("edit conflict")]
    EditConflict,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Persistence contract for movie records. The store owns the records and
/// the version-increment-on-update invariant; handlers hold transient
/// copies only.
#[async_trait::async_trait]
pub trait MovieStore: Send + Sync {
    /// Insert a new record, filling in the server-assigned id, creation
    /// timestamp, and initial version.
    async fn insert(&self, movie: &mut Movie) -> Result<(), StoreError>;

    async fn get(&self, id: i64) -> Result<Movie, StoreError>;

    /// Persist changed fields. The update only applies if the caller's
    /// version matches the stored one; a mismatch (or a concurrent delete)
    /// is an [`StoreError::EditConflict`]. On success the incremented
    /// version is written back into `movie`.
    async fn update(&self, movie: &mut Movie) -> Result<(), StoreError>;

    async fn delete(&self, id: i64) -> Result<(), StoreError>;

    /// Fetch a page of records matching the title and genre filters,
    /// together with pagination metadata for the full match count.
    async fn list(
        &self,
        title: &str,
        genres: &[String],
        filters: &Filters,
    ) -> Result<(Vec<Movie>, Metadata), StoreError>;
}
