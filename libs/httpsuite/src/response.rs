//! Response envelope writer.
//!
//! Every response leaves through [`send_response`] in one of two shapes:
//!
//! - success: `{"data": ..., "meta": {...}}` as `application/json`;
//! - error: an RFC 9457 [`Problem`] as `application/problem+json`.
//!
//! The status, content type and body are handed to a [`ResponseSink`] in a
//! single call, so headers can never be changed after body bytes are written.

use axum::response::IntoResponse;
use bytes::Bytes;
use http::{header, HeaderValue, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::problem::{Problem, APPLICATION_PROBLEM_JSON};

pub const APPLICATION_JSON: &str = "application/json";

/// Pagination metadata. Zero-valued fields are omitted from the wire form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    #[serde(default, skip_serializing_if = "is_zero")]
    pub page: u64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub page_size: u64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub total_pages: u64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub total_items: u64,
}

impl Meta {
    /// Metadata for one page, deriving `total_pages` from the item count.
    pub fn page(page: u64, page_size: u64, total_items: u64) -> Self {
        let total_pages = if page_size == 0 {
            0
        } else {
            total_items.div_ceil(page_size)
        };
        Self {
            page,
            page_size,
            total_pages,
            total_items,
        }
    }
}

fn is_zero(v: &u64) -> bool {
    *v == 0
}

/// Success envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("a response has already been written")]
    AlreadyWritten,
    #[error("failed to build response: {0}")]
    Http(#[from] http::Error),
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),
}

/// Destination of exactly one HTTP response.
pub trait ResponseSink {
    /// Writes status, content type and body together.
    fn write_response(
        &mut self,
        status: StatusCode,
        content_type: &'static str,
        body: Bytes,
    ) -> Result<(), SinkError>;
}

impl<S: ResponseSink + ?Sized> ResponseSink for &mut S {
    fn write_response(
        &mut self,
        status: StatusCode,
        content_type: &'static str,
        body: Bytes,
    ) -> Result<(), SinkError> {
        (**self).write_response(status, content_type, body)
    }
}

/// In-memory sink holding at most one response.
#[derive(Debug, Default)]
pub struct ResponseSlot {
    response: Option<http::Response<Bytes>>,
}

impl ResponseSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_written(&self) -> bool {
        self.response.is_some()
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.response.as_ref().map(http::Response::status)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.response
            .as_ref()
            .and_then(|r| r.headers().get(header::CONTENT_TYPE))
            .and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.response.as_ref().map(http::Response::body)
    }

    pub fn into_inner(self) -> Option<http::Response<Bytes>> {
        self.response
    }
}

impl ResponseSink for ResponseSlot {
    fn write_response(
        &mut self,
        status: StatusCode,
        content_type: &'static str,
        body: Bytes,
    ) -> Result<(), SinkError> {
        if self.response.is_some() {
            return Err(SinkError::AlreadyWritten);
        }
        let response = http::Response::builder()
            .status(status)
            .header(header::CONTENT_TYPE, HeaderValue::from_static(content_type))
            .body(body)?;
        self.response = Some(response);
        Ok(())
    }
}

impl IntoResponse for ResponseSlot {
    fn into_response(self) -> axum::response::Response {
        match self.response {
            Some(response) => response.map(axum::body::Body::from).into_response(),
            None => {
                tracing::warn!("handler finished without writing a response");
                let mut slot = ResponseSlot::new();
                send_problem(
                    &mut slot,
                    &Problem::new(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Internal Server Error",
                        "no response was produced",
                    ),
                );
                match slot.response {
                    Some(response) => response.map(axum::body::Body::from).into_response(),
                    None => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
                }
            }
        }
    }
}

/// Writes either a problem or a success envelope to `sink`.
///
/// A problem is written only when `status >= 400`; its own `status` then wins
/// over the `status` argument. Anything else becomes an [`Envelope`] sent with
/// `status`. If the envelope can't be serialized a 500 problem is sent
/// instead; failures to write are logged, never returned.
pub fn send_response<T, S>(
    sink: &mut S,
    status: StatusCode,
    data: Option<&T>,
    problem: Option<&Problem>,
    meta: Option<&Meta>,
) where
    T: Serialize + ?Sized,
    S: ResponseSink + ?Sized,
{
    if let Some(problem) = problem.filter(|_| status.as_u16() >= 400) {
        write_problem(sink, problem);
        return;
    }

    let envelope = Envelope {
        data,
        meta: meta.copied(),
    };
    match serde_json::to_vec(&envelope) {
        Ok(body) => {
            if let Err(err) = sink.write_response(status, APPLICATION_JSON, Bytes::from(body)) {
                tracing::error!(error = %err, status = status.as_u16(), "failed to write response");
            }
        }
        Err(err) => {
            tracing::error!(error = %err, "failed to serialize response envelope");
            let fallback = Problem::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error",
                err.to_string(),
            );
            write_problem(sink, &fallback);
        }
    }
}

/// Sends `problem` with its own status.
pub fn send_problem<S: ResponseSink + ?Sized>(sink: &mut S, problem: &Problem) {
    send_response::<(), S>(sink, problem.status_code(), None, Some(problem), None);
}

/// Sends `{"data": data}` with `status`.
pub fn send_data<T, S>(sink: &mut S, status: StatusCode, data: &T)
where
    T: Serialize + ?Sized,
    S: ResponseSink + ?Sized,
{
    send_response(sink, status, Some(data), None, None);
}

/// Sends `{"data": data, "meta": meta}` with `status`.
pub fn send_page<T, S>(sink: &mut S, status: StatusCode, data: &T, meta: &Meta)
where
    T: Serialize + ?Sized,
    S: ResponseSink + ?Sized,
{
    send_response(sink, status, Some(data), None, Some(meta));
}

fn write_problem<S: ResponseSink + ?Sized>(sink: &mut S, problem: &Problem) {
    let status = problem.status_code();
    let encoded = if status.as_u16() == problem.status {
        serde_json::to_vec(problem)
    } else {
        // body status must match the one actually sent
        serde_json::to_vec(&Problem {
            status: status.as_u16(),
            ..problem.clone()
        })
    };
    let body = match encoded {
        Ok(body) => body,
        Err(err) => {
            tracing::error!(error = %err, "failed to serialize problem");
            return;
        }
    };
    if let Err(err) = sink.write_response(status, APPLICATION_PROBLEM_JSON, Bytes::from(body)) {
        tracing::error!(
            error = %err,
            status = status.as_u16(),
            title = %problem.title,
            "failed to write problem response"
        );
    }
}
