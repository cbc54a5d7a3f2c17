use anyhow::Result;
use cinedex_app::state::{AppConfig, AppState};
use futures::FutureExt;
use tracing::{debug, info};

use crate::config::ServerConfig;

pub async fn run(args: ServerConfig) -> Result<()> {
    let state = build_state(&args).await?;
    run_with_state(args, state).await
}

pub async fn run_with_state(args: ServerConfig, state: AppState) -> Result<()> {
    let shutdown = tokio::signal::ctrl_c().map(|_| ());
    run_graceful_with_state(args, state, shutdown).await
}

pub async fn run_graceful_with_state<S>(
    args: ServerConfig,
    state: AppState,
    shutdown_signal: S,
) -> Result<()>
where
    S: std::future::Future<Output = ()> + Send + 'static,
{
    let mut app = cinedex_app::main_router(state);

    if !args.no_cors {
        app = app.layer(tower_http::cors::CorsLayer::very_permissive());
    }

    let ip: std::net::IpAddr = args.listen_address.parse()?;
    let addr = std::net::SocketAddr::from((ip, args.port));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server stopped");
    Ok(())
}

pub async fn build_state(config: &ServerConfig) -> Result<AppState> {
    let database_url = config.database_url();
    if config.database_url_is_default() {
        let data_dir = config.data_dir();
        if !data_dir.is_dir() {
            tokio::fs::create_dir_all(&data_dir).await?;
            info!("Created data directory {}", data_dir.display());
        }
    }

    let pool = cinedex_dal::new_pool_with(&database_url, config.db_max_connections).await?;
    let app_config = AppConfig {
        environment: config.environment.clone(),
        default_page_size: config.default_page_size,
        query_timeout: config.query_timeout,
    };
    debug!("Application config: {app_config:?}");
    Ok(AppState::new(app_config, pool))
}
