//! axum glue: turns an axum request into the buffered form the pipeline reads.

use axum::extract::{FromRequestParts, RawPathParams, Request};
use bytes::Bytes;
use http_body_util::LengthLimitError;
use thiserror::Error;

use crate::params::PathParams;

#[derive(Debug, Error)]
pub enum BufferError {
    #[error("request body exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("failed to read request body: {0}")]
    Body(#[source] axum::Error),
}

/// Buffers the body of `request` (at most `limit` bytes) and copies the route
/// parameters axum matched into [`PathParams`].
///
/// Routes without parameters simply get no [`PathParams`] extension.
pub async fn buffer_request(
    request: Request,
    limit: usize,
) -> Result<http::Request<Bytes>, BufferError> {
    let (mut parts, body) = request.into_parts();

    if let Ok(raw) = RawPathParams::from_request_parts(&mut parts, &()).await {
        let params: PathParams = raw.iter().collect();
        parts.extensions.insert(params);
    }

    let bytes = axum::body::to_bytes(body, limit)
        .await
        .map_err(|err| classify(err, limit))?;
    Ok(http::Request::from_parts(parts, bytes))
}

fn classify(err: axum::Error, limit: usize) -> BufferError {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(&err);
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return BufferError::TooLarge { limit };
        }
        source = e.source();
    }
    BufferError::Body(err)
}
