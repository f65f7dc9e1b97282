//! Immutable snapshot of an inbound request.
//!
//! Handlers and predicates never see the hyper body stream: the server
//! buffers the body once and hands every consumer the same `MockRequest`.
//! Cloning is an `Arc` bump, so the identity extractor can hand the request
//! out by value.

use bytes::Bytes;
use hyper::http::request::Parts;
use hyper::{HeaderMap, Method, Request, Uri};
use std::fmt;
use std::sync::Arc;

#[derive(Clone)]
pub struct MockRequest {
    inner: Arc<Inner>,
}

struct Inner {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
}

impl MockRequest {
    pub fn new(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            inner: Arc::new(Inner {
                method,
                uri,
                headers,
                body,
            }),
        }
    }

    /// Build from the head of a hyper request and an already collected body.
    pub fn from_parts(parts: Parts, body: Bytes) -> Self {
        Self::new(parts.method, parts.uri, parts.headers, body)
    }

    pub fn method(&self) -> &Method {
        &self.inner.method
    }

    pub fn uri(&self) -> &Uri {
        &self.inner.uri
    }

    pub fn path(&self) -> &str {
        self.inner.uri.path()
    }

    pub fn query(&self) -> Option<&str> {
        self.inner.uri.query()
    }

    /// Path plus `?query` when a query is present.
    pub fn request_uri(&self) -> String {
        match self.query() {
            Some(q) => format!("{}?{}", self.path(), q),
            None => self.path().to_string(),
        }
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.inner.headers
    }

    /// First value of the named header, if it is present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.inner
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
    }

    /// First value of the named query parameter, form-decoded.
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.query()
            .into_iter()
            .flat_map(|q| q.split('&'))
            .filter(|pair| !pair.is_empty())
            .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
            .find(|(key, _)| decode_component(key) == name)
            .map(|(_, value)| decode_component(value))
    }

    pub fn body(&self) -> &Bytes {
        &self.inner.body
    }
}

impl From<Request<Bytes>> for MockRequest {
    fn from(req: Request<Bytes>) -> Self {
        let (parts, body) = req.into_parts();
        Self::from_parts(parts, body)
    }
}

impl fmt::Debug for MockRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockRequest")
            .field("method", &self.inner.method)
            .field("uri", &self.inner.uri)
            .field("headers", &self.inner.headers)
            .field("body_len", &self.inner.body.len())
            .finish()
    }
}

/// Decode one `application/x-www-form-urlencoded` component.
fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced,
    }
}
