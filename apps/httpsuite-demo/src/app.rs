//! Routes served by the demo: a validated submit endpoint and a paginated
//! listing.

use std::sync::Arc;

use anyhow::Context;
use axum::{
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use httpsuite::{
    axum_support::{buffer_request, BufferError},
    parse_request, path_param, problem_types::BAD_REQUEST_ERROR,
    problem_types::VALIDATION_ERROR, query_param, send_data, send_page, send_problem, validate,
    Meta, ProblemTypes, RequestTarget, ResponseSlot,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use validator::Validate;

const MAX_PAGE_SIZE: u64 = 100;
const DEFAULT_PAGE_SIZE: u64 = 10;
const CATALOGUE_SIZE: u64 = 42;

#[derive(Clone)]
pub struct AppState {
    pub problems: Arc<ProblemTypes>,
    pub body_limit: usize,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct SampleRequest {
    #[serde(default)]
    #[validate(range(min = 1))]
    pub id: i64,
    #[serde(default)]
    #[validate(length(min = 3))]
    pub name: String,
    #[serde(default)]
    #[validate(range(min = 1))]
    pub age: u32,
}

impl RequestTarget for SampleRequest {
    fn set_param(&mut self, name: &str, value: &str) -> anyhow::Result<()> {
        if name == "id" {
            self.id = value
                .parse()
                .with_context(|| format!("'{value}' is not an integer"))?;
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct SampleResponse {
    pub id: i64,
    pub name: String,
    pub age: u32,
}

impl From<SampleRequest> for SampleResponse {
    fn from(req: SampleRequest) -> Self {
        Self {
            id: req.id,
            name: req.name,
            age: req.age,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
struct ListQuery {
    #[validate(range(min = 1))]
    page: u64,
    #[validate(range(min = 1, max = 100))]
    page_size: u64,
}

#[derive(Debug, Serialize)]
struct Item {
    id: u64,
    name: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/submit/{id}", post(submit))
        .route("/items", get(list_items))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn submit(State(state): State<AppState>, request: Request<Body>) -> ResponseSlot {
    let mut slot = ResponseSlot::new();

    let request = match buffer_request(request, state.body_limit).await {
        Ok(r) => r,
        Err(e) => {
            tracing::debug!(error = %e, "request body rejected");
            let problem = match e {
                BufferError::TooLarge { limit } => state.problems.problem(
                    BAD_REQUEST_ERROR,
                    StatusCode::PAYLOAD_TOO_LARGE,
                    "Payload Too Large",
                    format!("Request body exceeds {limit} bytes"),
                ),
                BufferError::Body(err) => state.problems.problem(
                    BAD_REQUEST_ERROR,
                    StatusCode::BAD_REQUEST,
                    "Invalid Request",
                    err.to_string(),
                ),
            };
            send_problem(&mut slot, &problem);
            return slot;
        }
    };

    if let Ok(req) = parse_request::<SampleRequest, _, _>(
        &mut slot,
        request,
        &state.problems,
        path_param,
        &["id"],
    ) {
        tracing::info!(id = req.id, "sample accepted");
        send_data(&mut slot, StatusCode::OK, &SampleResponse::from(req));
    }
    slot
}

fn parse_u64_or(raw: &str, default: u64) -> Option<u64> {
    if raw.is_empty() {
        Some(default)
    } else {
        raw.parse().ok()
    }
}

async fn list_items(State(state): State<AppState>, request: Request<Body>) -> ResponseSlot {
    let mut slot = ResponseSlot::new();
    let (parts, _) = request.into_parts();

    let (Some(page), Some(page_size)) = (
        parse_u64_or(&query_param(&parts, "page"), 1),
        parse_u64_or(&query_param(&parts, "page_size"), DEFAULT_PAGE_SIZE),
    ) else {
        let problem = state.problems.problem(
            BAD_REQUEST_ERROR,
            StatusCode::BAD_REQUEST,
            "Invalid Query",
            "page and page_size must be non-negative integers",
        );
        send_problem(&mut slot, &problem);
        return slot;
    };

    let query = ListQuery { page, page_size };
    if let Some(report) = validate(&query) {
        let problem = state
            .problems
            .problem(
                VALIDATION_ERROR,
                StatusCode::BAD_REQUEST,
                "Validation Error",
                "One or more fields failed validation.",
            )
            .with_extension("errors", report.to_value());
        send_problem(&mut slot, &problem);
        return slot;
    }

    let page_size = query.page_size.min(MAX_PAGE_SIZE);
    let start = (query.page - 1).saturating_mul(page_size);
    let end = start.saturating_add(page_size).min(CATALOGUE_SIZE);
    let items: Vec<Item> = (start..end)
        .map(|i| Item {
            id: i + 1,
            name: format!("item-{}", i + 1),
        })
        .collect();

    send_page(
        &mut slot,
        StatusCode::OK,
        &items,
        &Meta::page(query.page, page_size, CATALOGUE_SIZE),
    );
    slot
}
