//! Router-agnostic parameter extraction.
//!
//! The pipeline never talks to a router directly. It takes a function
//! `Fn(&Parts, &str) -> String` that returns the value of a named parameter,
//! or an empty string when the parameter is absent. This module provides the
//! common ones.

use http::request::Parts;

/// Route parameters matched by a router, stored in request extensions.
///
/// Router adapters insert this into `Parts::extensions`; [`path_param`] reads
/// it back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(Vec<(String, String)>);

impl PathParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    /// First value bound to `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for PathParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Reads a route parameter from [`PathParams`] in the request extensions.
pub fn path_param(parts: &Parts, key: &str) -> String {
    parts
        .extensions
        .get::<PathParams>()
        .and_then(|params| params.get(key))
        .unwrap_or_default()
        .to_string()
}

/// Reads a percent-decoded query-string parameter.
pub fn query_param(parts: &Parts, key: &str) -> String {
    parts
        .uri
        .query()
        .and_then(|query| {
            url::form_urlencoded::parse(query.as_bytes())
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.into_owned())
        })
        .unwrap_or_default()
}

/// Extractor for routers without named parameters: returns the path segment
/// right after `prefix`, whatever key is asked for.
///
/// With prefix `/submit/`, the path `/submit/123` yields `"123"`.
pub fn segment_after(prefix: &'static str) -> impl Fn(&Parts, &str) -> String + Clone {
    move |parts: &Parts, _key: &str| {
        parts
            .uri
            .path()
            .strip_prefix(prefix)
            .and_then(|rest| rest.split('/').next())
            .unwrap_or_default()
            .to_string()
    }
}
