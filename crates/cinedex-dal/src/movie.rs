use std::{collections::HashSet, time::Duration};

use garde::Validate;
use serde::{Deserialize, Serialize};
use sqlx::{Pool, QueryBuilder};
use time::PrimitiveDateTime;
use tracing::debug;

use crate::{
    DEFAULT_QUERY_TIMEOUT, Error, bounded,
    error::Result,
    filters::{Filters, Metadata, SortColumns},
    genre::{self, GenreScalar},
    runtime::Runtime,
};

pub const MOVIE_SORT_COLUMNS: &SortColumns = &[
    ("id", "m.id"),
    ("title", "m.title"),
    ("year", "m.year"),
    ("runtime", "m.runtime"),
];

const FIRST_FILM_YEAR: i32 = 1888;

fn not_in_future(year: &i32, _ctx: &()) -> garde::Result {
    let current_year = time::OffsetDateTime::now_utc().year();
    if *year > current_year {
        return Err(garde::Error::new("must not be in the future"));
    }
    Ok(())
}

#[allow(clippy::ptr_arg)]
fn unique_genres(genres: &Vec<String>, _ctx: &()) -> garde::Result {
    let mut seen = HashSet::with_capacity(genres.len());
    if genres.iter().all(|g| seen.insert(g)) {
        Ok(())
    } else {
        Err(garde::Error::new("must not contain duplicate values"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
#[garde(allow_unvalidated)]
pub struct Movie {
    pub id: i64,
    #[serde(skip)]
    pub created_at: Option<PrimitiveDateTime>,
    #[garde(length(bytes, min = 1, max = 500))]
    pub title: String,
    #[serde(skip_serializing_if = "is_zero_year")]
    #[garde(range(min = FIRST_FILM_YEAR), custom(not_in_future))]
    pub year: i32,
    #[serde(skip_serializing_if = "Runtime::is_zero")]
    #[garde(dive)]
    pub runtime: Runtime,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    #[garde(length(min = 1, max = 5), custom(unique_genres))]
    pub genres: Vec<String>,
    pub version: i32,
}

fn is_zero_year(year: &i32) -> bool {
    *year == 0
}

impl Movie {
    /// New, not yet persisted movie
    pub fn new(
        title: impl Into<String>,
        year: i32,
        runtime: impl Into<Runtime>,
        genres: Vec<String>,
    ) -> Self {
        Movie {
            id: 0,
            created_at: None,
            title: title.into(),
            year,
            runtime: runtime.into(),
            genres,
            version: 0,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CreateMovie {
    pub title: String,
    pub year: i32,
    pub runtime: Runtime,
    pub genres: Vec<String>,
}

impl From<CreateMovie> for Movie {
    fn from(value: CreateMovie) -> Self {
        Movie::new(value.title, value.year, value.runtime, value.genres)
    }
}

/// Partial update, absent fields keep current values
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateMovie {
    pub title: Option<String>,
    pub year: Option<i32>,
    pub runtime: Option<Runtime>,
    pub genres: Option<Vec<String>>,
    pub version: Option<i32>,
}

impl UpdateMovie {
    pub fn apply_to(self, movie: &mut Movie) -> Result<()> {
        if let Some(version) = self.version {
            if version != movie.version {
                debug!(
                    "Expected version {version} of movie {}, found {}",
                    movie.id, movie.version
                );
                return Err(Error::EditConflict {
                    id: movie.id,
                    version,
                });
            }
        }
        if let Some(title) = self.title {
            movie.title = title;
        }
        if let Some(year) = self.year {
            movie.year = year;
        }
        if let Some(runtime) = self.runtime {
            movie.runtime = runtime;
        }
        if let Some(genres) = self.genres {
            movie.genres = genres;
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct MovieList {
    pub movies: Vec<Movie>,
    pub metadata: Metadata,
}

#[derive(Debug, sqlx::FromRow)]
struct MovieRow {
    id: i64,
    created_at: PrimitiveDateTime,
    title: String,
    year: i32,
    runtime: i32,
    genres: Option<GenreScalar>,
    version: i32,
}

#[derive(Debug, sqlx::FromRow)]
struct CountedMovieRow {
    total: i64,
    #[sqlx(flatten)]
    movie: MovieRow,
}

impl TryFrom<MovieRow> for Movie {
    type Error = Error;

    fn try_from(row: MovieRow) -> Result<Self> {
        Ok(Movie {
            id: row.id,
            created_at: Some(row.created_at),
            title: row.title,
            year: row.year,
            runtime: Runtime::new(row.runtime),
            genres: genre::decode(row.genres)?,
            version: row.version,
        })
    }
}

/// Title terms as FTS5 query, every term must match
fn fulltext_query(term: &str) -> Option<String> {
    let terms = term
        .split_whitespace()
        .map(|t| format!("\"{}\"", t.replace('"', "\"\"")))
        .collect::<Vec<_>>();
    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" "))
    }
}

pub type MovieRepository = MovieRepositoryImpl<Pool<crate::ChosenDB>>;

pub struct MovieRepositoryImpl<E> {
    executor: E,
    query_timeout: Duration,
}

impl<'c, E> MovieRepositoryImpl<E>
where
    for<'a> &'a E: sqlx::Executor<'c, Database = crate::ChosenDB>,
{
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    pub fn with_query_timeout(mut self, query_timeout: Duration) -> Self {
        self.query_timeout = query_timeout;
        self
    }

    /// Validates and stores new movie
    pub async fn create(&self, payload: CreateMovie) -> Result<Movie> {
        let mut movie = Movie::from(payload);
        movie.validate()?;
        self.insert(&mut movie).await?;
        Ok(movie)
    }

    /// Stores movie, filling in id, created_at and version assigned by database.
    pub async fn insert(&self, movie: &mut Movie) -> Result<i64> {
        let genres = genre::encode(&movie.genres)?;
        let (id, created_at, version): (i64, PrimitiveDateTime, i32) = bounded(
            self.query_timeout,
            sqlx::query_as(
                "INSERT INTO movies (title, year, runtime, genres) VALUES (?, ?, ?, ?)
                RETURNING id, created_at, version",
            )
            .bind(&movie.title)
            .bind(movie.year)
            .bind(movie.runtime.minutes())
            .bind(genres)
            .fetch_one(&self.executor),
        )
        .await?;

        movie.id = id;
        movie.created_at = Some(created_at);
        movie.version = version;
        Ok(id)
    }

    pub async fn get(&self, id: i64) -> Result<Movie> {
        if id < 1 {
            return Err(Error::RecordNotFound(format!("Movie {id}")));
        }
        let row: Option<MovieRow> = bounded(
            self.query_timeout,
            sqlx::query_as(
                "SELECT id, created_at, title, year, runtime, genres, version
                FROM movies WHERE id = ?",
            )
            .bind(id)
            .fetch_optional(&self.executor),
        )
        .await?;

        row.ok_or_else(|| Error::RecordNotFound(format!("Movie {id}")))?
            .try_into()
    }

    /// Page of movies matching title terms and containing all `genres`.
    /// Empty title or genres do not filter.
    pub async fn get_all(
        &self,
        title: &str,
        genres: &[String],
        filters: &Filters,
    ) -> Result<MovieList> {
        let ordering = filters.ordering(MOVIE_SORT_COLUMNS)?;
        let genres_filter = genre::encode(genres)?;

        let mut query = QueryBuilder::<crate::ChosenDB>::new(
            "SELECT count(*) OVER() AS total, m.id AS id, m.created_at AS created_at,
            m.title AS title, m.year AS year, m.runtime AS runtime, m.genres AS genres,
            m.version AS version
            FROM movies m WHERE 1 = 1",
        );
        if let Some(terms) = fulltext_query(title) {
            query
                .push(" AND m.id IN (SELECT rowid FROM movies_fts WHERE movies_fts MATCH ")
                .push_bind(terms)
                .push(")");
        }
        if let Some(genres_filter) = genres_filter {
            query
                .push(" AND NOT EXISTS (SELECT 1 FROM json_each(")
                .push_bind(genres_filter)
                .push(") f WHERE f.value NOT IN (SELECT g.value FROM json_each(m.genres) g))");
        }
        query
            .push(format!(" ORDER BY {ordering}, m.id ASC LIMIT "))
            .push_bind(filters.limit())
            .push(" OFFSET ")
            .push_bind(filters.offset());
        debug!("Movies query: {}", query.sql());

        let rows: Vec<CountedMovieRow> = bounded(
            self.query_timeout,
            query.build_query_as().fetch_all(&self.executor),
        )
        .await?;

        let total = rows.first().map(|r| r.total).unwrap_or(0);
        let movies = rows
            .into_iter()
            .map(|r| Movie::try_from(r.movie))
            .collect::<Result<Vec<_>>>()?;
        let metadata = Metadata::calculate(
            u64::try_from(total).unwrap_or(0),
            filters.page,
            filters.page_size,
        );
        Ok(MovieList { movies, metadata })
    }

    /// Compare and swap on version, on success `movie.version` is incremented.
    pub async fn update(&self, movie: &mut Movie) -> Result<()> {
        let genres = genre::encode(&movie.genres)?;
        let result = bounded(
            self.query_timeout,
            sqlx::query(
                "UPDATE movies SET title = ?, year = ?, runtime = ?, genres = ?, version = version + 1
                WHERE id = ? AND version = ?",
            )
            .bind(&movie.title)
            .bind(movie.year)
            .bind(movie.runtime.minutes())
            .bind(genres)
            .bind(movie.id)
            .bind(movie.version)
            .execute(&self.executor),
        )
        .await?;

        if result.rows_affected() == 0 {
            debug!(
                "Movie {} was not updated, version {} is stale",
                movie.id, movie.version
            );
            Err(Error::EditConflict {
                id: movie.id,
                version: movie.version,
            })
        } else {
            movie.version += 1;
            Ok(())
        }
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        if id < 1 {
            return Err(Error::RecordNotFound(format!("Movie {id}")));
        }
        let res = bounded(
            self.query_timeout,
            sqlx::query("DELETE FROM movies WHERE id = ?")
                .bind(id)
                .execute(&self.executor),
        )
        .await?;

        if res.rows_affected() == 0 {
            Err(Error::RecordNotFound(format!("Movie {id}")))
        } else {
            Ok(())
        }
    }
}
