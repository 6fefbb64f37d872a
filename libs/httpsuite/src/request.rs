//! Request parsing pipeline.
//!
//! [`parse_request`] turns a buffered HTTP request into a validated request
//! object in four steps, stopping at the first failure:
//!
//! 1. decode the JSON body (an empty body yields `T::default()`);
//! 2. read each named parameter through the caller's extractor;
//! 3. assign it with [`RequestTarget::set_param`];
//! 4. run the declared constraints.
//!
//! On failure the matching problem response has already been written to the
//! sink when the error is returned; the caller must not write another one.

use bytes::Bytes;
use http::{request::Parts, Request, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use validator::Validate;

use crate::problem_types::{ProblemTypes, BAD_REQUEST_ERROR, SERVER_ERROR, VALIDATION_ERROR};
use crate::response::{send_problem, ResponseSink};
use crate::validation::{validate, ValidationReport};

/// A per-endpoint request type that can be filled from body and parameters.
///
/// # Example
///
/// ```rust
/// use httpsuite::RequestTarget;
/// use serde::Deserialize;
/// use validator::Validate;
///
/// #[derive(Debug, Default, Deserialize, Validate)]
/// struct GetUser {
///     #[serde(default)]
///     #[validate(range(min = 1))]
///     id: u64,
/// }
///
/// impl RequestTarget for GetUser {
///     fn set_param(&mut self, name: &str, value: &str) -> anyhow::Result<()> {
///         if name == "id" {
///             self.id = value.parse()?;
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait RequestTarget: DeserializeOwned + Default + Validate {
    /// Assigns a raw parameter value to the field `name`.
    ///
    /// Implementations coerce the value as needed and return an error when
    /// that fails. Unknown names should be ignored.
    fn set_param(&mut self, name: &str, value: &str) -> anyhow::Result<()>;
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid request body: {0}")]
    InvalidBody(#[source] serde_json::Error),

    #[error("missing parameter: {0}")]
    MissingParameter(String),

    #[error("failed to set parameter '{name}': {source}")]
    Parameter {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("validation failed for {} field(s)", .0.len())]
    Validation(ValidationReport),
}

impl ParseError {
    /// Status of the problem response that was sent for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ParseError::InvalidBody(_)
            | ParseError::MissingParameter(_)
            | ParseError::Validation(_) => StatusCode::BAD_REQUEST,
            ParseError::Parameter { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Decodes, fills and validates a `T` from `request`.
///
/// `extract` is asked for every name in `path_params`, in order, and must
/// return an empty string for absent keys. The request is consumed, so its
/// body is read exactly once.
pub fn parse_request<T, S, F>(
    sink: &mut S,
    request: Request<Bytes>,
    problems: &ProblemTypes,
    extract: F,
    path_params: &[&str],
) -> Result<T, ParseError>
where
    T: RequestTarget,
    S: ResponseSink + ?Sized,
    F: Fn(&Parts, &str) -> String,
{
    let (parts, body) = request.into_parts();

    let mut target = if body.is_empty() {
        T::default()
    } else {
        match serde_json::from_slice::<T>(&body) {
            Ok(target) => target,
            Err(err) => {
                tracing::debug!(error = %err, "rejecting request with invalid body");
                send_problem(
                    sink,
                    &problems.problem(
                        BAD_REQUEST_ERROR,
                        StatusCode::BAD_REQUEST,
                        "Invalid Request",
                        err.to_string(),
                    ),
                );
                return Err(ParseError::InvalidBody(err));
            }
        }
    };
    drop(body);

    for &name in path_params {
        let value = extract(&parts, name);
        if value.is_empty() {
            tracing::debug!(param = name, "rejecting request with missing parameter");
            send_problem(
                sink,
                &problems.problem(
                    BAD_REQUEST_ERROR,
                    StatusCode::BAD_REQUEST,
                    "Missing Parameter",
                    format!("Parameter {name} not found in request"),
                ),
            );
            return Err(ParseError::MissingParameter(name.to_string()));
        }

        if let Err(err) = target.set_param(name, &value) {
            tracing::debug!(param = name, error = %err, "failed to assign parameter");
            send_problem(
                sink,
                &problems
                    .problem(
                        SERVER_ERROR,
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Parameter Error",
                        format!("Failed to set field {name}"),
                    )
                    .with_extension("error", err.to_string()),
            );
            return Err(ParseError::Parameter {
                name: name.to_string(),
                source: err,
            });
        }
    }

    if let Some(report) = validate(&target) {
        tracing::debug!(fields = report.len(), "rejecting request that failed validation");
        send_problem(
            sink,
            &problems
                .problem(
                    VALIDATION_ERROR,
                    StatusCode::BAD_REQUEST,
                    "Validation Error",
                    "One or more fields failed validation.",
                )
                .with_extension("errors", Value::from(&report)),
        );
        return Err(ParseError::Validation(report));
    }

    Ok(target)
}
