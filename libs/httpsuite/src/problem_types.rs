//! Registry of problem types.
//!
//! Maps an error category (e.g. `validation_error`) to the path of its
//! documentation page and joins it with a configurable base URL to build the
//! `type` URI of a [`Problem`].
//!
//! Notes:
//! - Configure once at startup, read on every error response.
//! - Unknown categories resolve to `about:blank`, never to a partial URL.
//! - While the base URL is still `about:blank`, known categories resolve to the
//!   bare path.

use http::StatusCode;
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::problem::{Problem, BLANK_URL};

pub const VALIDATION_ERROR: &str = "validation_error";
pub const NOT_FOUND_ERROR: &str = "not_found_error";
pub const SERVER_ERROR: &str = "server_error";
pub const BAD_REQUEST_ERROR: &str = "bad_request_error";

/// Category → path pairs every registry starts with.
pub const DEFAULT_ERROR_PATHS: [(&str, &str); 4] = [
    (VALIDATION_ERROR, "/errors/validation-error"),
    (NOT_FOUND_ERROR, "/errors/not-found"),
    (SERVER_ERROR, "/errors/server-error"),
    (BAD_REQUEST_ERROR, "/errors/bad-request"),
];

#[derive(Debug)]
struct Inner {
    base_url: String,
    paths: HashMap<String, String>,
}

/// Thread-safe category → problem type URI registry.
#[derive(Debug)]
pub struct ProblemTypes {
    inner: RwLock<Inner>,
}

impl Default for ProblemTypes {
    fn default() -> Self {
        Self::new()
    }
}

impl ProblemTypes {
    /// Registry with the default categories and no base URL.
    pub fn new() -> Self {
        let paths = DEFAULT_ERROR_PATHS
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Self {
            inner: RwLock::new(Inner {
                base_url: BLANK_URL.to_string(),
                paths,
            }),
        }
    }

    /// Registry built from configuration values on top of the defaults.
    pub fn from_config<I, K, V>(base_url: Option<&str>, paths: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let registry = Self::new();
        if let Some(url) = base_url {
            registry.set_base_url(url);
        }
        registry.set_error_paths(paths);
        registry
    }

    pub fn set_base_url(&self, url: impl Into<String>) {
        self.inner.write().base_url = url.into();
    }

    pub fn base_url(&self) -> String {
        self.inner.read().base_url.clone()
    }

    /// Sets or overwrites the path of one category.
    pub fn set_error_path(&self, category: impl Into<String>, path: impl Into<String>) {
        self.inner.write().paths.insert(category.into(), path.into());
    }

    /// Sets or overwrites several categories under a single write lock.
    pub fn set_error_paths<I, K, V>(&self, paths: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut inner = self.inner.write();
        for (category, path) in paths {
            inner.paths.insert(category.into(), path.into());
        }
    }

    /// Full problem type URI for `category`, or `about:blank` if unknown.
    pub fn resolve(&self, category: &str) -> String {
        let inner = self.inner.read();
        match inner.paths.get(category) {
            Some(path) => {
                let base = if inner.base_url == BLANK_URL {
                    ""
                } else {
                    inner.base_url.as_str()
                };
                format!("{base}{path}")
            }
            None => BLANK_URL.to_string(),
        }
    }

    /// Builds a [`Problem`] whose type is resolved from `category`.
    pub fn problem(
        &self,
        category: &str,
        status: StatusCode,
        title: impl Into<String>,
        detail: impl Into<String>,
    ) -> Problem {
        Problem::new(status, title, detail).with_type(self.resolve(category))
    }
}
