use std::sync::Arc;
use teamgate_access::Gateway;
use teamgate_provider::GitHubProvider;
use teamgate_server::{
    app::{self, AppState},
    config::ServerConfig,
};
use teamgate_session::SessionManager;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from the optional file and the environment
    let config = ServerConfig::load().expect("failed to load configuration");
    tracing::info!("Loaded configuration");

    let session_config = config
        .session_config()
        .expect("invalid session configuration");
    let rules = config
        .membership_rules()
        .expect("invalid membership rules");
    tracing::info!(
        cookie = %session_config.name(),
        lifetime_seconds = session_config.lifetime(),
        rules = rules.rules().len(),
        "Configured session and access rules"
    );

    let provider = GitHubProvider::new(config.oauth).expect("invalid OAuth configuration");
    let gateway = Gateway::new(
        Arc::new(SessionManager::new(session_config)),
        provider,
        config.access,
    );

    let app = app::router(AppState::new(gateway, rules));

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .expect("failed to bind to address");

    tracing::info!("listening on http://{}", config.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
