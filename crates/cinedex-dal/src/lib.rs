pub mod error;
pub mod filters;
pub mod genre;
pub mod movie;
pub mod runtime;
pub mod schema;

use std::{future::Future, str::FromStr as _, time::Duration};

pub use error::Error;
pub use filters::{Filters, Metadata, Order};
pub use sqlx::Error as SqlxError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::{debug, info};

use crate::error::Result;

pub type ChosenDB = sqlx::Sqlite;
pub type Pool = sqlx::Pool<ChosenDB>;

pub const DEFAULT_MAX_CONNECTIONS: u32 = 50;
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(3);

pub async fn new_pool(database_url: &str) -> Result<Pool, Error> {
    new_pool_with(database_url, DEFAULT_MAX_CONNECTIONS).await
}

/// Opens the pool and makes sure the schema exists.
pub async fn new_pool_with(database_url: &str, max_connections: u32) -> Result<Pool, Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    let mut pool_options = SqlitePoolOptions::new().max_connections(max_connections);
    if database_url.contains(":memory:") {
        // every connection would get its own database
        pool_options = pool_options
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
    }
    let pool = pool_options.connect_with(options).await?;
    schema::ensure_schema(&pool).await?;
    info!("Connected to database {database_url}");
    Ok(pool)
}

/// Runs storage operation within given time limit.
/// When time is up the operation is dropped, which releases its connection.
pub(crate) async fn bounded<T, E, F>(limit: Duration, operation: F) -> Result<T>
where
    F: Future<Output = std::result::Result<T, E>>,
    Error: From<E>,
{
    match tokio::time::timeout(limit, operation).await {
        Ok(res) => res.map_err(Error::from),
        Err(_) => {
            debug!("Storage operation timed out after {limit:?}");
            Err(Error::Timeout(limit))
        }
    }
}
