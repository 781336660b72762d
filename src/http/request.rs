//! Outbound request description.
//!
//! # Responsibilities
//! - Hold method, URL and headers of the call being guarded
//! - Build a fresh transport request for every attempt
//!
//! # Design Decisions
//! - The description is immutable; attempts never share a mutable request
//! - The body is opaque bytes, re-attached on each attempt (cheap `Bytes` clone)

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use std::time::Duration;
use url::Url;

/// Method, URL and headers of a guarded request.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    method: Method,
    url: Url,
    headers: HeaderMap,
}

impl RequestSpec {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: Url) -> Self {
        Self::new(Method::POST, url)
    }

    /// Add a header, replacing any previous value for `name`.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Materialize the request for one attempt.
    pub fn build(&self, body: Option<&Bytes>, timeout: Duration) -> reqwest::Request {
        let mut request = reqwest::Request::new(self.method.clone(), self.url.clone());
        *request.headers_mut() = self.headers.clone();
        if let Some(bytes) = body {
            *request.body_mut() = Some(reqwest::Body::from(bytes.clone()));
        }
        if !timeout.is_zero() {
            *request.timeout_mut() = Some(timeout);
        }
        request
    }
}
