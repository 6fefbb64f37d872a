//! End-to-end tests: the pipeline and writer behind real axum routes.

use std::sync::Arc;

use anyhow::Context;
use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use httpsuite::{
    axum_support::buffer_request, parse_request, path_param, query_param, segment_after,
    send_data, send_page, Meta, ProblemTypes, RequestTarget, ResponseSlot,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower::ServiceExt;
use validator::Validate;

#[derive(Debug, Default, Deserialize, Validate)]
struct SampleRequest {
    #[serde(default)]
    #[validate(range(min = 1))]
    id: i64,
    #[serde(default)]
    #[validate(length(min = 3))]
    name: String,
    #[serde(default)]
    #[validate(range(min = 1))]
    age: u32,
}

impl RequestTarget for SampleRequest {
    fn set_param(&mut self, name: &str, value: &str) -> anyhow::Result<()> {
        if name == "id" {
            self.id = value.parse().context("id must be an integer")?;
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct SampleResponse {
    id: i64,
    name: String,
    age: u32,
}

#[derive(Clone)]
struct AppState {
    problems: Arc<ProblemTypes>,
}

async fn submit(State(state): State<AppState>, request: Request) -> ResponseSlot {
    let mut slot = ResponseSlot::new();
    let Ok(request) = buffer_request(request, 64 * 1024).await else {
        return slot;
    };
    if let Ok(req) = parse_request::<SampleRequest, _, _>(
        &mut slot,
        request,
        &state.problems,
        path_param,
        &["id"],
    ) {
        let resp = SampleResponse {
            id: req.id,
            name: req.name,
            age: req.age,
        };
        send_data(&mut slot, StatusCode::OK, &resp);
    }
    slot
}

async fn submit_plain(State(state): State<AppState>, request: Request) -> ResponseSlot {
    let mut slot = ResponseSlot::new();
    let Ok(request) = buffer_request(request, 64 * 1024).await else {
        return slot;
    };
    if let Ok(req) = parse_request::<SampleRequest, _, _>(
        &mut slot,
        request,
        &state.problems,
        segment_after("/plain/"),
        &["id"],
    ) {
        send_data(&mut slot, StatusCode::CREATED, &json!({"id": req.id}));
    }
    slot
}

async fn list(request: Request) -> impl IntoResponse {
    let (parts, _) = request.into_parts();
    let page: u64 = query_param(&parts, "page").parse().unwrap_or(1);
    let mut slot = ResponseSlot::new();
    send_page(
        &mut slot,
        StatusCode::OK,
        &["a", "b"],
        &Meta::page(page, 2, 6),
    );
    slot
}

fn app(problems: ProblemTypes) -> Router {
    let state = AppState {
        problems: Arc::new(problems),
    };
    Router::new()
        .route("/submit/{id}", post(submit))
        .route("/submit", post(submit))
        .route("/plain/{*rest}", post(submit_plain))
        .route("/items", get(list))
        .with_state(state)
}

async fn call(app: Router, uri: &str, body: &str) -> (StatusCode, String, Value) {
    let req = axum::http::Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let content_type = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, content_type, json)
}

fn is_problem(v: &Value) -> bool {
    v.get("type").is_some() && v.get("title").is_some() && v.get("status").is_some()
}

#[tokio::test]
async fn scenario_success_envelope() {
    let (status, ct, body) = call(
        app(ProblemTypes::new()),
        "/submit/123",
        r#"{"name":"John Doe","age":30}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ct, "application/json");
    assert_eq!(
        body,
        json!({"data": {"id": 123, "name": "John Doe", "age": 30}})
    );
    assert!(!is_problem(&body));
}

#[tokio::test]
async fn scenario_empty_body_validation_error() {
    let (status, ct, body) = call(app(ProblemTypes::new()), "/submit/123", "").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(ct, "application/problem+json");
    assert_eq!(body["title"], "Validation Error");
    assert_eq!(body["type"], "/errors/validation-error");
    assert_eq!(body["status"], 400);
    let errors = body["extensions"]["errors"].as_object().unwrap();
    let fields: Vec<_> = errors.keys().cloned().collect();
    assert!(fields.contains(&"name".to_string()));
    assert!(fields.contains(&"age".to_string()));
    assert!(body.get("data").is_none());
}

#[tokio::test]
async fn scenario_invalid_json() {
    let (status, ct, body) = call(app(ProblemTypes::new()), "/submit/123", "{invalid-json}").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(ct, "application/problem+json");
    assert_eq!(body["title"], "Invalid Request");
    assert!(body["detail"].as_str().unwrap().contains("line 1 column 2"));
}

#[tokio::test]
async fn scenario_missing_parameter() {
    let (status, _, body) = call(
        app(ProblemTypes::new()),
        "/submit",
        r#"{"name":"John Doe","age":30}"#,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["title"], "Missing Parameter");
    assert!(body["detail"].as_str().unwrap().contains("id"));
}

#[tokio::test]
async fn configured_registry_shows_in_problem_type() {
    let problems = ProblemTypes::new();
    problems.set_base_url("https://api.example.com");
    problems.set_error_path("validation_error", "/errors/validation-error");

    let (_, _, body) = call(app(problems), "/submit/123", r#"{"name":"Jo"}"#).await;
    assert_eq!(
        body["type"],
        "https://api.example.com/errors/validation-error"
    );
}

#[tokio::test]
async fn coercion_failure_is_internal_error() {
    let (status, ct, body) = call(
        app(ProblemTypes::new()),
        "/submit/abc",
        r#"{"name":"John Doe","age":30}"#,
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(ct, "application/problem+json");
    assert_eq!(body["status"], 500);
    assert!(body["extensions"]["error"]
        .as_str()
        .unwrap()
        .contains("id must be an integer"));
}

#[tokio::test]
async fn segment_extractor_without_named_params() {
    let (status, _, body) = call(
        app(ProblemTypes::new()),
        "/plain/77",
        r#"{"name":"John Doe","age":30}"#,
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({"data": {"id": 77}}));
}

#[tokio::test]
async fn paginated_envelope_from_query() {
    let req = axum::http::Request::builder()
        .uri("/items?page=2")
        .body(Body::empty())
        .unwrap();
    let resp = app(ProblemTypes::new()).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(
        body,
        json!({
            "data": ["a", "b"],
            "meta": {"page": 2, "page_size": 2, "total_pages": 3, "total_items": 6}
        })
    );
}
