use std::{net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};

use {
    axum::{Router, routing::get},
    redwind_config::RedwindConfig,
    redwind_plugins::{PluginDescriptor, PluginHost, PluginReport, register_plugins},
    sqlx::{SqlitePool, sqlite::SqliteConnectOptions},
    tower_http::{
        cors::{Any, CorsLayer},
        trace::TraceLayer,
    },
    tracing::{info, warn},
};

use crate::{
    auth_routes::auth_router,
    routes::{fetch_context_handler, health_handler, settings_handler},
    state::AppState,
};

// ── Server startup ───────────────────────────────────────────────────────────

/// Resolve `database.path` against the data directory when relative.
pub fn database_path(config: &RedwindConfig) -> PathBuf {
    let path = PathBuf::from(&config.database.path);
    if path.is_absolute() {
        path
    } else {
        redwind_config::data_dir().join(path)
    }
}

/// Open (and create if missing) the SQLite database.
pub async fn open_database(path: &std::path::Path) -> anyhow::Result<SqlitePool> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    Ok(SqlitePool::connect_with(options).await?)
}

/// Build the full router (shared between production startup and tests):
/// core routes, the auth API, and whatever the plugins contributed.
pub fn build_app(state: AppState, plugin_routes: Router<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/settings", get(settings_handler))
        .route("/api/fetch_context", get(fetch_context_handler))
        .nest("/api/auth", auth_router())
        .merge(plugin_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Open the stores, register plugins, and assemble the application.
pub async fn prepare_app(
    config: Arc<RedwindConfig>,
    pool: SqlitePool,
    http: reqwest::Client,
    plugins: &[PluginDescriptor<AppState>],
) -> anyhow::Result<(Router, PluginReport)> {
    let state = AppState::new(Arc::clone(&config), pool).await?;

    let mut host = PluginHost::new(Arc::clone(&config), http);
    let report = register_plugins(&mut host, plugins, &config.plugins.enabled);
    let (plugin_routes, fetchers) = host.into_parts();

    let state = state.with_fetchers(fetchers);
    Ok((build_app(state, plugin_routes), report))
}

/// Start the HTTP server and run until it stops.
pub async fn start_gateway(
    config: RedwindConfig,
    plugins: &[PluginDescriptor<AppState>],
) -> anyhow::Result<()> {
    let config = Arc::new(config);

    let db_path = database_path(&config);
    let pool = open_database(&db_path).await?;
    info!(path = %db_path.display(), "database opened");

    if config.auth.password_hash.is_none() {
        warn!(
            "auth.password_hash is not set; login is disabled (see `redwind auth hash-password`)"
        );
    }

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.twitter.timeout_secs))
        .build()?;
    let (app, report) = prepare_app(Arc::clone(&config), pool, http, plugins).await?;
    info!(
        registered = ?report.registered,
        skipped = ?report.skipped,
        failed = report.failed.len(),
        "plugins activated"
    );

    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, site = %config.site.base_url(), "redwind listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
