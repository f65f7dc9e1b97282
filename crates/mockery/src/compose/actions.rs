//! Leaf DSL actions: headers, bodies, delays and logging.
//!
//! Headers and delays are `pre` decorations. Status and body writes are
//! `post` decorations, so a header declared after the body still lands
//! before the response is committed.

use super::Composer;
use crate::delay::{DelaySampler, DelaySpec};
use crate::error::ConfigError;
use crate::handler::{handler_fn, Handler, ResponseWriter};
use crate::request::MockRequest;
use async_trait::async_trait;
use bytes::Bytes;
use hyper::header::{HeaderName, HeaderValue, CONTENT_TYPE, TRAILER};
use hyper::StatusCode;
use serde::Serialize;
use std::fmt::Write as _;
use std::io::Read;
use std::panic::Location;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), ConfigError> {
    match (
        HeaderName::from_bytes(name.as_bytes()),
        HeaderValue::from_str(value),
    ) {
        (Ok(name), Ok(value)) => Ok((name, value)),
        _ => Err(ConfigError::InvalidHeader {
            name: name.to_string(),
            value: value.to_string(),
        }),
    }
}

impl Composer {
    /// Add a response header.
    pub fn header(&mut self, name: &str, value: &str) -> Result<(), ConfigError> {
        let (name, value) = parse_header(name, value)?;
        self.decorate(
            Some(handler_fn(move |_, w| {
                w.add_header(name.clone(), value.clone())
            })),
            None,
        );
        Ok(())
    }

    /// Announce `name` in a `Trailer` header and send it after the body.
    ///
    /// Declare it after the response body: only then does its value get
    /// written once the response is committed.
    pub fn trailer(&mut self, name: &str, value: &str) -> Result<(), ConfigError> {
        let (name, value) = parse_header(name, value)?;
        let announced = HeaderValue::from(name.clone());
        self.decorate(
            Some(handler_fn(move |_, w| {
                w.add_header(TRAILER, announced.clone())
            })),
            Some(handler_fn(move |_, w| {
                w.add_header(name.clone(), value.clone())
            })),
        );
        Ok(())
    }

    /// Commit `status` with no body.
    pub fn respond(&mut self, status: StatusCode) {
        self.decorate(None, Some(handler_fn(move |_, w| w.write_header(status))));
    }

    pub fn respond_with_bytes(&mut self, status: StatusCode, body: impl Into<Bytes>) {
        let body = body.into();
        self.decorate(
            None,
            Some(handler_fn(move |_, w| {
                w.write_header(status);
                w.write(&body);
            })),
        );
    }

    pub fn respond_with_string(&mut self, status: StatusCode, body: impl Into<String>) {
        self.respond_with_bytes(status, Bytes::from(body.into()));
    }

    /// Serialize `body` now and send it with `Content-Type: application/json`.
    pub fn respond_with_json<T>(&mut self, status: StatusCode, body: &T) -> Result<(), ConfigError>
    where
        T: Serialize + ?Sized,
    {
        let data = Bytes::from(serde_json::to_vec(body)?);
        self.decorate(
            None,
            Some(handler_fn(move |_, w| {
                w.set_header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                w.write_header(status);
                w.write(&data);
            })),
        );
        Ok(())
    }

    /// Send the contents of `path`, read on every request. A read failure
    /// answers 500 with an empty body.
    pub fn respond_with_file(&mut self, status: StatusCode, path: impl Into<PathBuf>) {
        let handler = FileBody {
            status,
            path: path.into(),
        };
        self.decorate(None, Some(Arc::new(handler)));
    }

    /// Send whatever `producer` yields, called once per request.
    pub fn respond_with_reader<F, R>(&mut self, status: StatusCode, producer: F)
    where
        F: Fn() -> R + Send + Sync + 'static,
        R: Read,
    {
        self.decorate(
            None,
            Some(handler_fn(move |req, w| {
                let mut body = Vec::new();
                if let Err(e) = producer().read_to_end(&mut body) {
                    error!(uri = %req.uri(), error = %e, "body reader failed");
                }
                w.write_header(status);
                w.write(&body);
            })),
        );
    }

    pub fn created(&mut self) {
        self.respond(StatusCode::CREATED);
    }

    pub fn not_found(&mut self) {
        self.respond(StatusCode::NOT_FOUND);
    }

    pub fn respond_with_bad_request(&mut self, body: impl Into<Bytes>) {
        self.respond_with_bytes(StatusCode::BAD_REQUEST, body);
    }

    pub fn respond_with_internal_server_error(&mut self, body: impl Into<Bytes>) {
        self.respond_with_bytes(StatusCode::INTERNAL_SERVER_ERROR, body);
    }

    /// Sleep for a sample of `spec` before the rest of the handler runs.
    pub fn delay(&mut self, spec: &DelaySpec) {
        let handler = Delay {
            sampler: spec.sampler(),
        };
        self.decorate(Some(Arc::new(handler)), None);
    }

    pub fn fixed_delay(&mut self, delay: &str) -> Result<(), ConfigError> {
        self.delay(&DelaySpec::fixed(delay)?);
        Ok(())
    }

    pub fn uniform_delay(&mut self, min: &str, max: &str) -> Result<(), ConfigError> {
        self.delay(&DelaySpec::uniform(min, max)?);
        Ok(())
    }

    pub fn normal_delay(&mut self, mean: &str, stddev: &str, max: &str) -> Result<(), ConfigError> {
        self.delay(&DelaySpec::normal(mean, stddev, max)?);
        Ok(())
    }

    /// Log where this call was made, plus `comment`, on every request.
    #[track_caller]
    pub fn log_location(&mut self, comment: &str) {
        let caller = Location::caller();
        let location = format!("{}:{}", caller.file(), caller.line());
        let comment = comment.to_string();
        self.decorate(
            Some(handler_fn(move |_, _| {
                info!(%location, comment = %comment, "endpoint defined");
            })),
            None,
        );
    }

    /// Log a dump of every request before handling it.
    pub fn log_request(&mut self) {
        self.decorate(
            Some(handler_fn(|req, _| {
                info!(request = %dump_request(req), "request received");
            })),
            None,
        );
    }
}

struct FileBody {
    status: StatusCode,
    path: PathBuf,
}

#[async_trait]
impl Handler for FileBody {
    async fn serve(&self, _req: &MockRequest, w: &mut ResponseWriter) {
        match tokio::fs::read(&self.path).await {
            Ok(data) => {
                w.write_header(self.status);
                w.write(&data);
            }
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "failed to read body file");
                w.write_header(StatusCode::INTERNAL_SERVER_ERROR);
            }
        }
    }
}

struct Delay {
    sampler: DelaySampler,
}

#[async_trait]
impl Handler for Delay {
    async fn serve(&self, _req: &MockRequest, _w: &mut ResponseWriter) {
        let wait = self.sampler.sample();
        tokio::time::sleep(wait).await;
    }
}

/// Request line, headers and body, roughly as they arrived on the wire.
fn dump_request(req: &MockRequest) -> String {
    let mut out = format!("{} {} HTTP/1.1\r\n", req.method(), req.request_uri());
    for (name, value) in req.headers() {
        let _ = write!(out, "{}: {}\r\n", name, String::from_utf8_lossy(value.as_bytes()));
    }
    out.push_str("\r\n");
    out.push_str(&String::from_utf8_lossy(req.body()));
    out
}
