mod api;
mod generation;
mod in_flight;
mod middleware;
mod scheduler;

use std::sync::Arc;

use inbrain_clusterer::ClustererClient;
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    in_flight::InFlight,
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(inbrain_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = inbrain_db::PoolConfig::from_app_config(&config);
    let pool = inbrain_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = inbrain_db::run_migrations(&pool).await?;
    tracing::info!(applied, "migrations complete");

    let clusterer = ClustererClient::from_app_config(&config)?.map(Arc::new);
    if clusterer.is_none() {
        tracing::warn!("GROQ_API_KEY not set; cluster generation is disabled");
    }
    let in_flight = InFlight::default();

    let _scheduler = scheduler::build_scheduler(
        pool.clone(),
        clusterer.clone(),
        in_flight.clone(),
        config.cluster_schedule.as_deref(),
    )
    .await?;

    let auth = AuthState::from_env(matches!(
        config.env,
        inbrain_core::Environment::Development
    ))?;
    let app = build_app(
        AppState {
            pool,
            clusterer,
            in_flight,
        },
        auth,
        default_rate_limit_state(),
    );

    tracing::info!(bind_addr = %config.bind_addr, env = %config.env, "starting server");
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
