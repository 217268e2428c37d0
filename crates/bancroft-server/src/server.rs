//! Router assembly and serving.

use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;

use bancroft_auth::{
    MemorySessionStore, SigninError, SigninFlowState, SigninOrchestrator, signin_router,
};

use crate::config::ServerConfig;

/// Builds the application router from validated configuration.
///
/// # Errors
///
/// Returns [`SigninError::Configuration`] when the portal configuration
/// is incomplete.
pub fn build_router(config: &ServerConfig) -> Result<Router, SigninError> {
    let sessions = Arc::new(MemorySessionStore::new(config.portal.session.idle_timeout));
    let orchestrator = Arc::new(SigninOrchestrator::new(&config.portal, sessions)?);

    let state = SigninFlowState {
        orchestrator,
        session: config.portal.session.clone(),
    };

    Ok(signin_router(state).layer(TraceLayer::new_for_http()))
}

/// Binds the listener and serves until shutdown.
///
/// # Errors
///
/// Returns the bind or serve error.
pub async fn run(config: &ServerConfig) -> std::io::Result<()> {
    let router = build_router(config).map_err(std::io::Error::other)?;

    let listener = tokio::net::TcpListener::bind(&config.listen).await?;
    tracing::info!(listen = %config.listen, "Bancroft portal sign-in server started");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("Shutdown signal received");
    }
}
