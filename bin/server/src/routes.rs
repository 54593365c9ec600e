//! HTTP routes.
//!
//! - `POST /auto-reply`: answer one inbound message
//! - `GET /`: status of the service and the inference server it talks to

use crate::payload::InboundMessage;
use crate::reply::ReplyOrchestrator;
use autoreply_core::ReplyId;
use axum::extract::{FromRequest, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{Instrument, debug, info, info_span};

const LOG_PREVIEW_CHARS: usize = 200;

/// Shared state for request handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<ReplyOrchestrator>,
}

impl AppState {
    #[must_use]
    pub fn new(orchestrator: ReplyOrchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
        }
    }
}

/// Body returned for a successful (or deliberately empty) reply.
#[derive(Debug, Serialize)]
pub struct ReplyBody {
    pub message: String,
}

/// Body returned by the status route.
#[derive(Debug, Serialize)]
pub struct StatusBody {
    pub status: &'static str,
    pub lm_studio_url: String,
    pub configured_model: String,
    pub active_model: String,
    pub conversations: usize,
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(status))
        .route("/auto-reply", post(auto_reply))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn preview(text: &str) -> String {
    text.trim().chars().take(LOG_PREVIEW_CHARS).collect()
}

/// Decodes a JSON or form-encoded body. Bodies that fail to decode are
/// treated as empty payloads.
async fn read_payload(request: Request) -> InboundMessage {
    let is_form = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

    if is_form {
        match Form::<HashMap<String, String>>::from_request(request, &()).await {
            Ok(Form(fields)) => InboundMessage::from_form(fields),
            Err(rejection) => {
                debug!(error = %rejection, "Could not decode form payload");
                InboundMessage::from_json(&Value::Null)
            }
        }
    } else {
        match Json::<Value>::from_request(request, &()).await {
            Ok(Json(payload)) => InboundMessage::from_json(&payload),
            Err(rejection) => {
                debug!(error = %rejection, "Could not decode JSON payload");
                InboundMessage::from_json(&Value::Null)
            }
        }
    }
}

async fn auto_reply(State(state): State<AppState>, request: Request) -> Response {
    let reply_id = ReplyId::new();
    let span = info_span!("auto_reply", reply_id = %reply_id);

    async move {
        let inbound = read_payload(request).await;

        info!(
            sender = %inbound.sender_name,
            conversation_id = %inbound.conversation_id,
            text = %preview(&inbound.text),
            "Incoming message"
        );

        if inbound.is_empty() {
            return Json(ReplyBody {
                message: String::new(),
            })
            .into_response();
        }

        match state
            .orchestrator
            .handle_incoming(&inbound.conversation_id, &inbound.text)
            .await
        {
            Ok(reply) => {
                info!(
                    sender = %inbound.sender_name,
                    conversation_id = %inbound.conversation_id,
                    reply = %preview(&reply),
                    "Reply"
                );
                Json(ReplyBody { message: reply }).into_response()
            }
            Err(e) => {
                info!(
                    conversation_id = %inbound.conversation_id,
                    error = %e,
                    code = e.code(),
                    "No reply produced"
                );
                e.into_response()
            }
        }
    }
    .instrument(span)
    .await
}

async fn status(State(state): State<AppState>) -> Json<StatusBody> {
    let orchestrator = &state.orchestrator;
    let backend = orchestrator.backend();
    let configured_model = orchestrator.params().model.clone();

    Json(StatusBody {
        status: "ok",
        lm_studio_url: backend.endpoint().to_string(),
        active_model: backend.active_model(&configured_model).await,
        configured_model,
        conversations: orchestrator.store().conversation_count(),
    })
}
