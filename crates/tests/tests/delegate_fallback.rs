use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use sift_api::{build_app, ServiceConfig};
use sift_strategy::{DelegateConfig, DelegateError, FieldDelegate, OpenAiDelegate};
use tower::ServiceExt;

const TEXT: &str = "Send Samsung phone to 90210 this afternoon";

#[derive(Clone)]
enum StubReply {
    Content(&'static str),
    Status(StatusCode),
    RawBody(&'static str),
    Stall,
}

#[derive(Clone)]
struct StubState {
    reply: StubReply,
    last_request: Arc<Mutex<Option<Value>>>,
}

async fn chat_completions(State(state): State<StubState>, Json(body): Json<Value>) -> Response {
    *state.last_request.lock().unwrap() = Some(body);

    match state.reply {
        StubReply::Content(content) => Json(json!({
            "id": "chatcmpl-test",
            "object": "chat.completion",
            "choices": [
                {
                    "index": 0,
                    "message": { "role": "assistant", "content": content },
                    "finish_reason": "stop"
                }
            ]
        }))
        .into_response(),
        StubReply::Status(status) => {
            (status, Json(json!({ "error": { "message": "nope" } }))).into_response()
        }
        StubReply::RawBody(body) => (
            StatusCode::OK,
            [("content-type", "application/json")],
            body,
        )
            .into_response(),
        StubReply::Stall => {
            tokio::time::sleep(Duration::from_secs(30)).await;
            StatusCode::OK.into_response()
        }
    }
}

async fn spawn_stub(reply: StubReply) -> (SocketAddr, Arc<Mutex<Option<Value>>>) {
    let last_request = Arc::new(Mutex::new(None));
    let router = Router::new()
        .route("/v1/chat/completions", post(chat_completions))
        .with_state(StubState {
            reply,
            last_request: last_request.clone(),
        });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (addr, last_request)
}

fn delegated_app(addr: SocketAddr) -> Router {
    let config = ServiceConfig {
        delegate: DelegateConfig {
            enabled: true,
            api_key: Some("sk-test".to_string()),
            model: "gpt-test".to_string(),
            base_url: format!("http://{addr}/v1"),
            timeout: Duration::from_millis(500),
        },
        ..ServiceConfig::default()
    };
    build_app(&config).expect("app should build")
}

async fn classify(app: Router) -> (String, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/classify")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "text": TEXT }).to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let source = response
        .headers()
        .get("x-extraction-source")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (source, serde_json::from_slice(&body).unwrap())
}

fn rule_answer() -> Value {
    json!({
        "zip": "90210",
        "brand": "Samsung",
        "category": "electronics",
        "time_pref": "afternoon"
    })
}

#[tokio::test]
async fn delegate_answer_is_returned() {
    let (addr, last_request) = spawn_stub(StubReply::Content(
        r#"{"zip": "90210", "brand": "Samsung", "category": "phones", "time_pref": "this afternoon"}"#,
    ))
    .await;

    let (source, body) = classify(delegated_app(addr)).await;
    assert_eq!(source, "delegate");
    assert_eq!(
        body,
        json!({
            "zip": "90210",
            "brand": "Samsung",
            "category": "phones",
            "time_pref": "this afternoon"
        })
    );

    let sent = last_request.lock().unwrap().clone().expect("stub saw a request");
    assert_eq!(sent["model"], "gpt-test");
    assert_eq!(sent["temperature"], 0.0);
    assert_eq!(sent["max_tokens"], 200);
    assert!(sent["messages"][1]["content"]
        .as_str()
        .unwrap()
        .contains(TEXT));
}

#[tokio::test]
async fn prose_and_missing_keys_are_tolerated() {
    let (addr, _) = spawn_stub(StubReply::Content(
        "Here you go:\n{\"brand\": \"Samsung\", \"zip\": 90210}\nAnything else?",
    ))
    .await;

    let (source, body) = classify(delegated_app(addr)).await;
    assert_eq!(source, "delegate");
    assert_eq!(
        body,
        json!({ "zip": "90210", "brand": "Samsung", "category": null, "time_pref": null })
    );
}

#[tokio::test]
async fn malformed_output_falls_back_to_rules() {
    let (addr, _) = spawn_stub(StubReply::Content("I am unable to help with that.")).await;

    let (source, body) = classify(delegated_app(addr)).await;
    assert_eq!(source, "fallback");
    assert_eq!(body, rule_answer());
}

#[tokio::test]
async fn undecodable_completion_is_malformed_output() {
    let (addr, _) = spawn_stub(StubReply::RawBody("<html>bad gateway</html>")).await;
    let delegate = OpenAiDelegate::new(
        "sk-test",
        "gpt-test",
        &format!("http://{addr}/v1"),
        Duration::from_millis(500),
    )
    .unwrap();

    let err = delegate.extract(TEXT).await.unwrap_err();
    assert!(matches!(err, DelegateError::MalformedOutput(_)));
    assert_eq!(err.kind(), "malformed_output");

    let (source, body) = classify(delegated_app(addr)).await;
    assert_eq!(source, "fallback");
    assert_eq!(body, rule_answer());
}

#[tokio::test]
async fn error_status_falls_back_to_rules() {
    let (addr, _) = spawn_stub(StubReply::Status(StatusCode::UNAUTHORIZED)).await;

    let (source, body) = classify(delegated_app(addr)).await;
    assert_eq!(source, "fallback");
    assert_eq!(body, rule_answer());
}

#[tokio::test]
async fn stalled_delegate_falls_back_after_timeout() {
    let (addr, _) = spawn_stub(StubReply::Stall).await;

    let (source, body) = classify(delegated_app(addr)).await;
    assert_eq!(source, "fallback");
    assert_eq!(body, rule_answer());
}

#[tokio::test]
async fn unreachable_delegate_falls_back_to_rules() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (source, body) = classify(delegated_app(addr)).await;
    assert_eq!(source, "fallback");
    assert_eq!(body, rule_answer());
}

#[tokio::test]
async fn health_reports_delegate_enabled() {
    let (addr, _) = spawn_stub(StubReply::Content("{}")).await;

    let response = delegated_app(addr)
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let parsed: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(parsed["openai_enabled"], true);
    assert_eq!(parsed["strategy"], "delegated");
}
