//! # httpsuite - request parsing and response envelopes
//!
//! A thin layer between a router and handler code:
//!
//! - **Parse**: decode a JSON body and bind route parameters onto a typed
//!   request ([`parse_request`], [`RequestTarget`]).
//! - **Validate**: run `validator` constraints and report failures per field
//!   ([`validate`], [`ValidationReport`]).
//! - **Respond**: send `{"data", "meta"}` envelopes or RFC 9457 problems
//!   ([`send_response`], [`Problem`]).
//!
//! Problem `type` URIs come from an injectable [`ProblemTypes`] registry.
//!
//! ## Example
//!
//! ```rust,ignore
//! use httpsuite::{parse_request, path_param, send_data, ResponseSlot};
//!
//! async fn submit(State(app): State<AppState>, request: Request) -> impl IntoResponse {
//!     let mut slot = ResponseSlot::new();
//!     let request = buffer_request(request, 64 * 1024).await?;
//!     if let Ok(req) = parse_request::<SampleRequest, _, _>(
//!         &mut slot, request, &app.problems, path_param, &["id"],
//!     ) {
//!         send_data(&mut slot, StatusCode::OK, &SampleResponse::from(req));
//!     }
//!     slot
//! }
//! ```

pub mod axum_support;
pub mod params;
pub mod problem;
pub mod problem_types;
pub mod request;
pub mod response;
pub mod validation;

pub use params::{path_param, query_param, segment_after, PathParams};
pub use problem::{Problem, APPLICATION_PROBLEM_JSON, BLANK_URL};
pub use problem_types::ProblemTypes;
pub use request::{parse_request, ParseError, RequestTarget};
pub use response::{
    send_data, send_page, send_problem, send_response, Envelope, Meta, ResponseSink,
    ResponseSlot, SinkError, APPLICATION_JSON,
};
pub use validation::{validate, ValidationReport};
