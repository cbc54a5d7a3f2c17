use std::{path::PathBuf, time::Duration};

use anyhow::Result;
pub use clap::Parser;

#[derive(Debug, Clone, clap::Parser)]
pub struct ServerConfig {
    #[arg(
        short,
        long,
        default_value_t = 4000,
        env = "CINEDEX_LISTEN_PORT",
        help = "Port to listen on"
    )]
    pub port: u16,
    #[arg(
        short,
        long,
        default_value = "127.0.0.1",
        env = "CINEDEX_LISTEN_ADDRESS",
        help = "Address to listen on"
    )]
    pub listen_address: String,

    #[arg(
        long,
        env = "CINEDEX_ENV",
        default_value = "development",
        help = "Environment name reported by healthcheck (development|staging|production)"
    )]
    pub environment: String,

    #[arg(
        long,
        env = "CINEDEX_DATABASE_URL",
        help = "Database URL e.g. sqlite://file.db, default is sqlite://[data-dir]/cinedex.db, where data-dir is set by --data-dir"
    )]
    database_url: Option<String>,

    #[arg(
        long,
        env = "CINEDEX_DATA_DIR",
        help = "Data directory, default is system default like ~/.local/share/cinedex"
    )]
    data_dir: Option<PathBuf>,

    #[arg(
        long,
        env = "CINEDEX_DB_MAX_CONNECTIONS",
        default_value_t = cinedex_dal::DEFAULT_MAX_CONNECTIONS,
        help = "Maximum number of open database connections"
    )]
    pub db_max_connections: u32,

    #[arg(
        long,
        env = "CINEDEX_QUERY_TIMEOUT",
        default_value = "3s",
        help = "Time limit of single database operation in human friendly format (e.g. 3s, 500ms)",
        value_parser = humantime::parse_duration
    )]
    pub query_timeout: Duration,

    #[arg(
        long,
        env = "CINEDEX_DEFAULT_PAGE_SIZE",
        default_value_t = cinedex_dal::filters::DEFAULT_PAGE_SIZE,
        value_parser = clap::value_parser!(u32).range(1..=cinedex_dal::filters::MAX_PAGE_SIZE as i64),
        help = "Default page size of listings"
    )]
    pub default_page_size: u32,

    #[arg(long, env = "CINEDEX_NO_CORS", help = "Disable CORS")]
    pub no_cors: bool,
}

impl ServerConfig {
    pub fn load() -> Result<Self> {
        ServerConfig::try_parse().map_err(|e| e.into())
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|p| p.join("cinedex"))
                .unwrap_or_else(|| PathBuf::from("cinedex"))
        })
    }

    pub fn database_url(&self) -> String {
        self.database_url
            .clone()
            .unwrap_or_else(|| format!("sqlite://{}/cinedex.db", self.data_dir().display()))
    }

    /// Database lives in data directory
    pub fn database_url_is_default(&self) -> bool {
        self.database_url.is_none()
    }
}
