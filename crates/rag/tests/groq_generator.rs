use axum::{extract::State, http::HeaderMap, http::StatusCode, routing::post, Json, Router};
use quickrag::{Generator, GroqConfig, GroqGenerator, Pipeline, RagError};
use quickrag_vector_store::{StubEmbedder, VectorStore};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct MockGroq {
    requests: Mutex<Vec<Value>>,
}

async fn completions(
    State(state): State<Arc<MockGroq>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some("Bearer gsk-test") {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": { "message": "Invalid API Key", "type": "invalid_request_error" } })),
        );
    }
    let prompt = body["messages"][1]["content"].as_str().unwrap_or_default().to_string();
    state.requests.lock().unwrap().push(body);
    (
        StatusCode::OK,
        Json(json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": format!("echo: {}", prompt.len()) },
                "finish_reason": "stop"
            }]
        })),
    )
}

async fn start_mock(state: Arc<MockGroq>) -> String {
    let app = Router::new()
        .route("/openai/v1/chat/completions", post(completions))
        .with_state(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/openai/v1")
}

fn config(base_url: String, key: &str) -> GroqConfig {
    GroqConfig {
        api_key: Some(key.to_string()),
        base_url,
        ..GroqConfig::default()
    }
}

#[tokio::test]
async fn sends_system_and_user_messages() {
    let state = Arc::new(MockGroq::default());
    let url = start_mock(state.clone()).await;

    let generator = GroqGenerator::new(&config(url, "gsk-test")).unwrap();
    let reply = generator.generate("hello there").await.unwrap();
    assert_eq!(reply, "echo: 11");

    let requests = state.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["model"], "llama-3.1-8b-instant");
    assert_eq!(
        requests[0]["messages"],
        json!([
            { "role": "system", "content": "You are a helpful assistant." },
            { "role": "user", "content": "hello there" }
        ])
    );
}

#[tokio::test]
async fn api_errors_surface_with_status_and_message() {
    let state = Arc::new(MockGroq::default());
    let url = start_mock(state.clone()).await;

    let generator = GroqGenerator::new(&config(url, "wrong")).unwrap();
    match generator.generate("hi").await.unwrap_err() {
        RagError::Upstream { service, message } => {
            assert_eq!(service, "Groq");
            assert!(message.contains("401"), "{message}");
            assert!(message.contains("Invalid API Key"), "{message}");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(state.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn pipeline_answer_goes_through_groq() {
    let state = Arc::new(MockGroq::default());
    let url = start_mock(state.clone()).await;

    let generator = GroqGenerator::new(&config(url, "gsk-test")).unwrap();
    let mut pipeline = Pipeline::new(Arc::new(StubEmbedder::new(16)), Box::new(VectorStore::new()))
        .with_generator(Box::new(generator));
    pipeline
        .index(
            vec![
                "Orders ship within two days".to_string(),
                "Refunds take five business days".to_string(),
            ],
            1,
        )
        .await
        .unwrap();

    pipeline
        .answer("Refunds take five business days", 1)
        .await
        .unwrap();

    let requests = state.requests.lock().unwrap();
    let prompt = requests[0]["messages"][1]["content"].as_str().unwrap();
    assert_eq!(
        prompt,
        "Context:\nRefunds take five business days\n\nUser Query: Refunds take five business days\n\nAnswer concisely and cite which retrieved docs you used."
    );
}
