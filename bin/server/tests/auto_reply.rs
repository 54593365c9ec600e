use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use autoreply_conversation::MessageTurn;
use autoreply_core::ConversationId;
use autoreply_server::build_orchestrator;
use autoreply_server::config::AppConfig;
use autoreply_server::routes::{AppState, router};
use axum::Json;
use axum::Router;
use axum::body::Body;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{Request, StatusCode};
use axum::routing::{get, post};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower::ServiceExt;

const JID: &str = "111@s.whatsapp.net";

#[derive(Clone)]
struct MockLm {
    reply: &'static str,
    delay: Duration,
    hits: Arc<AtomicUsize>,
}

impl MockLm {
    fn replying(reply: &'static str) -> Self {
        Self {
            reply,
            delay: Duration::ZERO,
            hits: Arc::default(),
        }
    }

    fn stalled() -> Self {
        Self {
            reply: "too late",
            delay: Duration::from_secs(30),
            hits: Arc::default(),
        }
    }

    fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

async fn chat_completions(State(mock): State<MockLm>, Json(_body): Json<Value>) -> Json<Value> {
    mock.hits.fetch_add(1, Ordering::SeqCst);
    if !mock.delay.is_zero() {
        tokio::time::sleep(mock.delay).await;
    }
    Json(json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": mock.reply},
            "finish_reason": "stop"
        }]
    }))
}

/// Starts a mock inference server and returns its port.
async fn spawn_mock(mock: MockLm) -> u16 {
    let app = Router::new()
        .route("/v1/chat/completions", post(chat_completions))
        .with_state(mock);
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind mock");
    let port = listener.local_addr().expect("mock addr").port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock server");
    });
    port
}

/// Returns a port nothing is listening on.
async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    listener.local_addr().expect("addr").port()
}

fn config_for(lm_port: u16) -> AppConfig {
    AppConfig {
        lm_studio_host: "127.0.0.1".to_string(),
        lm_studio_port: lm_port,
        lm_studio_model: "test-model".to_string(),
        lm_request_timeout: 5.0,
        ..AppConfig::default()
    }
}

fn build_app(config: &AppConfig) -> (AppState, Router) {
    let state = AppState::new(build_orchestrator(config).expect("orchestrator"));
    let app = router(state.clone());
    (state, app)
}

fn json_request(payload: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/auto-reply")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .expect("request")
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let body = serde_json::from_slice(&bytes).expect("json body");
    (status, body)
}

fn history(state: &AppState) -> Vec<MessageTurn> {
    state.orchestrator.store().get(&ConversationId::from(JID))
}

#[tokio::test]
async fn replies_with_model_text_and_records_both_turns() {
    let mock = MockLm::replying("hi there");
    let (state, app) = build_app(&config_for(spawn_mock(mock.clone()).await));

    let (status, body) = send(&app, json_request(json!({"jid": JID, "text": "hello"}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "hi there"}));
    assert_eq!(
        history(&state),
        vec![MessageTurn::user("hello"), MessageTurn::assistant("hi there")]
    );
    assert_eq!(mock.hits(), 1);
}

#[tokio::test]
async fn conversation_off_the_allow_list_is_rejected() {
    let mock = MockLm::replying("hi there");
    let config = AppConfig {
        allowed_jids: "222@s.whatsapp.net".to_string(),
        ..config_for(spawn_mock(mock.clone()).await)
    };
    let (state, app) = build_app(&config);

    let (status, body) = send(&app, json_request(json!({"jid": JID, "text": "hello"}))).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({"message": "", "error": "not_permitted"}));
    assert!(history(&state).is_empty());
    assert_eq!(mock.hits(), 0);
}

#[tokio::test]
async fn stalled_model_times_out_and_keeps_user_turn() {
    let mock = MockLm::stalled();
    let config = AppConfig {
        lm_request_timeout: 0.2,
        ..config_for(spawn_mock(mock.clone()).await)
    };
    let (state, app) = build_app(&config);

    let (status, body) = send(&app, json_request(json!({"jid": JID, "text": "hello"}))).await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body, json!({"message": "", "error": "timeout"}));
    assert_eq!(history(&state), vec![MessageTurn::user("hello")]);
    assert_eq!(mock.hits(), 1);
}

#[tokio::test]
async fn unreachable_model_is_reported() {
    let (state, app) = build_app(&config_for(closed_port().await));

    let (status, body) = send(&app, json_request(json!({"jid": JID, "text": "hello"}))).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body, json!({"message": "", "error": "unreachable"}));
    assert_eq!(history(&state), vec![MessageTurn::user("hello")]);
}

#[tokio::test]
async fn empty_text_is_a_no_op() {
    let mock = MockLm::replying("unused");
    let (state, app) = build_app(&config_for(spawn_mock(mock.clone()).await));

    let (status, body) = send(&app, json_request(json!({"jid": JID, "text": "   "}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": ""}));
    assert!(history(&state).is_empty());
    assert_eq!(mock.hits(), 0);
}

#[tokio::test]
async fn form_encoded_payload_is_accepted() {
    let mock = MockLm::replying("hi there");
    let (state, app) = build_app(&config_for(spawn_mock(mock).await));

    let request = Request::builder()
        .method("POST")
        .uri("/auto-reply")
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("jid=111%40s.whatsapp.net&message=hello"))
        .expect("request");
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "hi there"}));
    assert_eq!(history(&state).len(), 2);
}

#[tokio::test]
async fn history_stays_bounded_across_requests() {
    let mock = MockLm::replying("ok");
    let (state, app) = build_app(&config_for(spawn_mock(mock.clone()).await));

    for i in 0..6 {
        let (status, _) = send(
            &app,
            json_request(json!({"jid": JID, "text": format!("message {i}")})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let turns = history(&state);
    assert_eq!(turns.len(), 8);
    assert_eq!(turns[0], MessageTurn::user("message 2"));
    assert_eq!(turns[7], MessageTurn::assistant("ok"));
    assert_eq!(mock.hits(), 6);
}

#[tokio::test]
async fn status_reports_configuration() {
    let mock = MockLm::replying("hi there");
    let port = spawn_mock(mock).await;
    let (_state, app) = build_app(&config_for(port));

    send(&app, json_request(json!({"jid": JID, "text": "hello"}))).await;

    let request = Request::builder()
        .uri("/")
        .body(Body::empty())
        .expect("request");
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(
        body["lm_studio_url"],
        format!("http://127.0.0.1:{port}/v1/chat/completions")
    );
    assert_eq!(body["configured_model"], "test-model");
    assert_eq!(body["active_model"], "test-model");
    assert_eq!(body["conversations"], 1);
}

#[tokio::test]
async fn slow_model_discovery_does_not_eat_completion_deadline() {
    let sent_model: Arc<Mutex<Option<Value>>> = Arc::default();
    let lm = Router::new()
        .route(
            "/v1/models",
            get(|| async {
                tokio::time::sleep(Duration::from_millis(300)).await;
                Json(json!({"data": [{"id": "loaded-model"}]}))
            }),
        )
        .route(
            "/v1/chat/completions",
            post(
                |State(sent): State<Arc<Mutex<Option<Value>>>>, Json(body): Json<Value>| async move {
                    *sent.lock().expect("lock") = Some(body["model"].clone());
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    Json(json!({"choices": [{"message": {"role": "assistant", "content": "hi"}}]}))
                },
            ),
        )
        .with_state(sent_model.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind mock");
    let port = listener.local_addr().expect("mock addr").port();
    tokio::spawn(async move {
        axum::serve(listener, lm).await.expect("mock server");
    });

    let config = AppConfig {
        lm_studio_model: "not-loaded".to_string(),
        lm_request_timeout: 0.4,
        ..config_for(port)
    };
    let (_state, app) = build_app(&config);

    let (status, body) = send(&app, json_request(json!({"jid": JID, "text": "hello"}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "hi"}));
    assert_eq!(
        *sent_model.lock().expect("lock"),
        Some(json!("loaded-model"))
    );
}
