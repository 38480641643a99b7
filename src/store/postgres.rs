use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};

use crate::config::DatabaseConfig;
use crate::model::{Filters, Metadata, Movie, Runtime};
use crate::store::traits::{MovieStore, StoreError};

/// Bounded wait for the initial connection; a database that cannot be
/// reached within this window fails startup.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a connection pool sized from the config and verify the
    /// database is reachable.
    pub async fn new(database_url: &str, config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .idle_timeout(Duration::from_secs(config.max_idle_secs))
            .acquire_timeout(CONNECT_TIMEOUT)
            .connect(database_url)
            .await
            .context("failed to create PostgreSQL connection pool")?;

        Ok(Self { pool })
    }

    /// Run the embedded database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("failed to run database migrations")?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn row_to_movie(row: &PgRow) -> Movie {
    Movie {
        id: row.get("id"),
        created_at: row.get("created_at"),
        title: row.get("title"),
        year: row.get("year"),
        runtime: Runtime(row.get("runtime")),
        genres: row.get("genres"),
        version: row.get("version"),
    }
}

#[async_trait::async_trait]
impl MovieStore for PostgresStore {
    async fn insert(&self, movie: &mut Movie) -> Result<(), StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO movies (title, year, runtime, genres)
            VALUES ($1, $2, $3, $4)
            RETURNING id, created_at, version
            "#,
        )
        .bind(&movie.title)
        .bind(movie.year)
        .bind(movie.runtime.minutes())
        .bind(&movie.genres)
        .fetch_one(&self.pool)
        .await?;

        movie.id = row.get("id");
        movie.created_at = row.get("created_at");
        movie.version = row.get("version");
        Ok(())
    }

    async fn get(&self, id: i64) -> Result<Movie, StoreError> {
        let row = sqlx::query(
            "SELECT id, created_at, title, year, runtime, genres, version FROM movies WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Err(StoreError::RecordNotFound);
        };

        Ok(row_to_movie(&row))
    }

    async fn update(&self, movie: &mut Movie) -> Result<(), StoreError> {
        // The version guard makes the update an optimistic-concurrency
        // check: zero rows means a concurrent edit or delete won.
        let row = sqlx::query(
            r#"
            UPDATE movies
            SET title = $1, year = $2, runtime = $3, genres = $4, version = version + 1
            WHERE id = $5 AND version = $6
            RETURNING version
            "#,
        )
        .bind(&movie.title)
        .bind(movie.year)
        .bind(movie.runtime.minutes())
        .bind(&movie.genres)
        .bind(movie.id)
        .bind(movie.version)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                movie.version = row.get("version");
                Ok(())
            }
            None => Err(StoreError::EditConflict),
        }
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM movies WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::RecordNotFound);
        }
        Ok(())
    }

    async fn list(
        &self,
        title: &str,
        genres: &[String],
        filters: &Filters,
    ) -> Result<(Vec<Movie>, Metadata), StoreError> {
        // The sort column and direction come from the validated safelist,
        // never from raw client input, so interpolating them is safe.
        let query = format!(
            r#"
            SELECT count(*) OVER(), id, created_at, title, year, runtime, genres, version
            FROM movies
            WHERE (to_tsvector('simple', title) @@ plainto_tsquery('simple', $1) OR $1 = '')
            AND (genres @> $2 OR $2 = '{{}}')
            ORDER BY {} {}, id ASC
            LIMIT $3 OFFSET $4
            "#,
            filters.sort_column(),
            filters.sort_direction(),
        );

        let rows = sqlx::query(&query)
            .bind(title)
            .bind(genres)
            .bind(filters.limit())
            .bind(filters.offset())
            .fetch_all(&self.pool)
            .await?;

        let total_records = rows.first().map_or(0, |row| row.get::<i64, _>("count"));
        let movies = rows.iter().map(row_to_movie).collect();
        let metadata = Metadata::calculate(total_records, filters.page, filters.page_size);

        Ok((movies, metadata))
    }
}
