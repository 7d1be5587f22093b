mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, AppState},
    middleware::{AdminState, RateLimitState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = sovdb_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = sovdb_db::PoolConfig {
        max_connections: config.db_max_connections,
        min_connections: config.db_min_connections,
        acquire_timeout_secs: config.db_acquire_timeout_secs,
    };
    let pool = pool_config.connect(&config.database_url).await?;
    let applied = sovdb_db::run_migrations(&pool).await?;
    if applied > 0 {
        tracing::info!(applied, "database migrations applied");
    }

    let roster = sovdb_core::load_competitors(&config.competitors_path)?;
    tracing::info!(
        competitors = roster.competitors.len(),
        "competitor roster loaded"
    );

    let is_development = matches!(config.env, sovdb_core::Environment::Development);
    let admin = AdminState::from_config(
        config.admin_password.as_deref(),
        config.admin_session_ttl_secs,
        is_development,
    )?;

    let llm = match &config.llm_api_key {
        Some(key) => Some(Arc::new(sovdb_llm::CompletionClient::with_base_url(
            key,
            &config.llm_model,
            config.llm_request_timeout_secs,
            config.llm_max_retries,
            config.llm_retry_backoff_base_ms,
            &config.llm_base_url,
        )?)),
        None => {
            tracing::warn!("SOVDB_LLM_API_KEY not set; onboarding analysis and narratives disabled");
            None
        }
    };

    let _scheduler = scheduler::build_scheduler(pool.clone()).await?;

    let rate_limit = RateLimitState::new(
        config.rate_limit_max_requests,
        Duration::from_secs(config.rate_limit_window_secs),
    );
    let app = build_app(
        AppState {
            pool,
            competitors: Arc::new(roster.competitors),
            llm,
            admin,
        },
        rate_limit,
    );

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
