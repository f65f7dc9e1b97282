//! Buffered response writer handed to every handler.
//!
//! Status and headers stay mutable until the response is committed by the
//! first [`ResponseWriter::write_header`] or body write. After that, header
//! additions only land as trailers when their name was announced in a
//! `Trailer` header; anything else is dropped.

use bytes::{Bytes, BytesMut};
use futures::stream;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full, StreamBody};
use hyper::body::Frame;
use hyper::header::{HeaderName, HeaderValue, TRAILER};
use hyper::{HeaderMap, Response, StatusCode};
use std::convert::Infallible;
use tracing::{debug, trace};

pub type ResponseBody = BoxBody<Bytes, hyper::Error>;

#[derive(Debug, Default)]
pub struct ResponseWriter {
    status: Option<StatusCode>,
    headers: HeaderMap,
    trailers: HeaderMap,
    body: BytesMut,
}

impl ResponseWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a header value. After commit this only succeeds for
    /// announced trailers.
    pub fn add_header(&mut self, name: HeaderName, value: HeaderValue) {
        if !self.is_committed() {
            self.headers.append(name, value);
        } else if self.is_announced_trailer(&name) {
            self.trailers.append(name, value);
        } else {
            trace!(header = %name, "header added after commit ignored");
        }
    }

    /// Replace any existing values of a header.
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        if !self.is_committed() {
            self.headers.insert(name, value);
        } else if self.is_announced_trailer(&name) {
            self.trailers.insert(name, value);
        } else {
            trace!(header = %name, "header set after commit ignored");
        }
    }

    /// Commit the status. Only the first call has an effect.
    pub fn write_header(&mut self, status: StatusCode) {
        match self.status {
            None => self.status = Some(status),
            Some(committed) => {
                debug!(%committed, ignored = %status, "superfluous write_header call");
            }
        }
    }

    /// Append body bytes, committing 200 if nothing was committed yet.
    pub fn write(&mut self, data: &[u8]) {
        if self.status.is_none() {
            self.status = Some(StatusCode::OK);
        }
        self.body.extend_from_slice(data);
    }

    pub fn is_committed(&self) -> bool {
        self.status.is_some()
    }

    /// Committed status, or 200 when nothing was committed.
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn trailers(&self) -> &HeaderMap {
        &self.trailers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    fn is_announced_trailer(&self, name: &HeaderName) -> bool {
        self.headers
            .get_all(TRAILER)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(','))
            .any(|announced| announced.trim().eq_ignore_ascii_case(name.as_str()))
    }

    /// Convert into a hyper response. Without trailers the body is a single
    /// sized chunk, so hyper can send a `Content-Length`. With trailers it is
    /// one data frame followed by a trailers frame.
    pub fn into_response(self) -> Response<ResponseBody> {
        let status = self.status();
        let body: ResponseBody = if self.trailers.is_empty() {
            Full::new(self.body.freeze())
                .map_err(|never| match never {})
                .boxed()
        } else {
            let mut frames: Vec<Frame<Bytes>> = Vec::with_capacity(2);
            if !self.body.is_empty() {
                frames.push(Frame::data(self.body.freeze()));
            }
            frames.push(Frame::trailers(self.trailers));
            StreamBody::new(stream::iter(
                frames.into_iter().map(Ok::<_, Infallible>),
            ))
            .map_err(|never| match never {})
            .boxed()
        };

        let mut response = Response::new(body);
        *response.status_mut() = status;
        *response.headers_mut() = self.headers;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &'static str) -> HeaderName {
        HeaderName::from_static(s)
    }

    fn value(s: &'static str) -> HeaderValue {
        HeaderValue::from_static(s)
    }

    #[test]
    fn test_uncommitted_defaults_to_200_empty() {
        let w = ResponseWriter::new();
        assert!(!w.is_committed());
        assert_eq!(w.status(), StatusCode::OK);
        assert!(w.body().is_empty());
    }

    #[test]
    fn test_first_write_header_wins() {
        let mut w = ResponseWriter::new();
        w.write_header(StatusCode::NOT_ACCEPTABLE);
        w.write_header(StatusCode::NOT_FOUND);
        assert_eq!(w.status(), StatusCode::NOT_ACCEPTABLE);
    }

    #[test]
    fn test_body_write_commits_200() {
        let mut w = ResponseWriter::new();
        w.write(b"hello");
        w.write_header(StatusCode::CREATED);
        assert_eq!(w.status(), StatusCode::OK);
        assert_eq!(w.body(), b"hello");
    }

    #[test]
    fn test_headers_frozen_after_commit() {
        let mut w = ResponseWriter::new();
        w.add_header(name("x-before"), value("1"));
        w.write_header(StatusCode::OK);
        w.add_header(name("x-after"), value("2"));
        assert_eq!(w.headers().get("x-before").unwrap(), "1");
        assert!(w.headers().get("x-after").is_none());
        assert!(w.trailers().is_empty());
    }

    #[test]
    fn test_announced_trailer_is_collected() {
        let mut w = ResponseWriter::new();
        w.add_header(TRAILER, value("X-Checksum"));
        w.write(b"data");
        w.add_header(name("x-checksum"), value("abc"));
        assert_eq!(w.trailers().get("x-checksum").unwrap(), "abc");
        assert!(w.headers().get("x-checksum").is_none());
    }

    #[test]
    fn test_set_header_replaces() {
        let mut w = ResponseWriter::new();
        w.add_header(name("content-type"), value("text/plain"));
        w.set_header(name("content-type"), value("application/json"));
        assert_eq!(w.headers().get_all("content-type").iter().count(), 1);
    }

    #[tokio::test]
    async fn test_into_response_without_trailers_is_sized() {
        use hyper::body::Body;

        let mut w = ResponseWriter::new();
        w.write(b"hello");
        let response = w.into_response();
        assert_eq!(response.body().size_hint().exact(), Some(5));
        let collected = response.into_body().collect().await.unwrap();
        assert!(collected.trailers().is_none());
        assert_eq!(collected.to_bytes(), Bytes::from_static(b"hello"));

        let empty = ResponseWriter::new().into_response();
        assert_eq!(empty.body().size_hint().exact(), Some(0));
    }

    #[tokio::test]
    async fn test_into_response_carries_trailers() {
        let mut w = ResponseWriter::new();
        w.add_header(TRAILER, value("x-done"));
        w.write_header(StatusCode::ACCEPTED);
        w.write(b"payload");
        w.add_header(name("x-done"), value("yes"));

        let response = w.into_response();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let collected = response.into_body().collect().await.unwrap();
        let trailers = collected.trailers().cloned().unwrap();
        assert_eq!(trailers.get("x-done").unwrap(), "yes");
        assert_eq!(collected.to_bytes(), Bytes::from_static(b"payload"));
    }
}
