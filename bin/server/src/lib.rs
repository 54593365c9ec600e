//! autoreply webhook server.
//!
//! Receives chat messages from a messaging-automation client, answers them
//! with a locally hosted language model, and keeps a short per-conversation
//! history in memory so replies have continuity.

pub mod config;
pub mod error;
pub mod payload;
pub mod reply;
pub mod routes;

use crate::config::AppConfig;
use crate::error::StartupError;
use crate::reply::ReplyOrchestrator;
use crate::routes::{AppState, router};
use autoreply_ai::OpenAiCompatClient;
use autoreply_conversation::ConversationStore;
use std::sync::Arc;

/// Builds the orchestrator described by `config`.
///
/// # Errors
///
/// Returns an error if the completion client cannot be built.
pub fn build_orchestrator(
    config: &AppConfig,
) -> autoreply_core::Result<ReplyOrchestrator, StartupError> {
    let client = OpenAiCompatClient::new(&config.lm_studio_base_url()).map_err(|e| {
        StartupError::Client {
            reason: e.to_string(),
        }
    })?;

    Ok(ReplyOrchestrator::new(
        ConversationStore::new(config.max_turns),
        config.allow_list(),
        Arc::new(client),
        config.model_params(),
    ))
}

/// Runs the webhook until interrupted.
///
/// # Errors
///
/// Returns an error if the server cannot be set up or stops abnormally.
pub async fn serve(config: AppConfig) -> autoreply_core::Result<(), StartupError> {
    let orchestrator = build_orchestrator(&config)?;
    tracing::info!(
        lm_studio_url = %orchestrator.backend().endpoint(),
        model = %config.lm_studio_model,
        restricted = config.allow_list().is_restricted(),
        max_turns = config.max_turns,
        "Loaded configuration"
    );

    let app = router(AppState::new(orchestrator));

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| StartupError::Bind {
            addr: addr.clone(),
            reason: e.to_string(),
        })?;

    tracing::info!("listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| StartupError::Serve {
            reason: e.to_string(),
        })?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
