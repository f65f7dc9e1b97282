//! Runtime handler abstraction.
//!
//! Everything the composer builds is an `Arc<dyn Handler>`. Handlers are
//! immutable once built and are shared across concurrent requests.

mod writer;

pub use writer::{ResponseBody, ResponseWriter};

use crate::request::MockRequest;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait Handler: Send + Sync {
    async fn serve(&self, req: &MockRequest, w: &mut ResponseWriter);
}

pub type SharedHandler = Arc<dyn Handler>;

/// Does nothing. The starting point of every composition.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHandler;

#[async_trait]
impl Handler for NoopHandler {
    async fn serve(&self, _req: &MockRequest, _w: &mut ResponseWriter) {}
}

pub fn noop() -> SharedHandler {
    Arc::new(NoopHandler)
}

/// Synchronous closure as a handler.
pub struct FnHandler<F>(F);

#[async_trait]
impl<F> Handler for FnHandler<F>
where
    F: Fn(&MockRequest, &mut ResponseWriter) + Send + Sync,
{
    async fn serve(&self, req: &MockRequest, w: &mut ResponseWriter) {
        (self.0)(req, w)
    }
}

pub fn handler_fn<F>(f: F) -> SharedHandler
where
    F: Fn(&MockRequest, &mut ResponseWriter) + Send + Sync + 'static,
{
    Arc::new(FnHandler(f))
}

/// `pre; delegate; post`.
pub struct Decorated {
    pre: Option<SharedHandler>,
    delegate: SharedHandler,
    post: Option<SharedHandler>,
}

impl Decorated {
    pub fn new(
        pre: Option<SharedHandler>,
        delegate: SharedHandler,
        post: Option<SharedHandler>,
    ) -> Self {
        Self {
            pre,
            delegate,
            post,
        }
    }
}

#[async_trait]
impl Handler for Decorated {
    async fn serve(&self, req: &MockRequest, w: &mut ResponseWriter) {
        if let Some(pre) = &self.pre {
            pre.serve(req, w).await;
        }
        self.delegate.serve(req, w).await;
        if let Some(post) = &self.post {
            post.serve(req, w).await;
        }
    }
}

/// Run a handler against a fresh writer.
pub async fn respond(handler: &dyn Handler, req: &MockRequest) -> ResponseWriter {
    let mut w = ResponseWriter::new();
    handler.serve(req, &mut w).await;
    w
}
