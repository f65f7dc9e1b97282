//! HTTP/1.1 server in front of a configured [`Mockery`].
//!
//! Each connection gets its own task. Request bodies are buffered in full
//! before dispatch, and the dispatcher's [`ResponseWriter`] is turned back
//! into a hyper response, trailers included.

mod network;

pub use network::create_reusable_listener;

use crate::compose::Mockery;
use crate::config::ListenConfig;
use crate::handler::{ResponseBody, ResponseWriter};
use crate::request::MockRequest;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::future::Future;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

pub struct MockServer {
    listen: ListenConfig,
    mockery: Mockery,
}

impl MockServer {
    pub fn new(listen: ListenConfig, mockery: Mockery) -> Self {
        Self { listen, mockery }
    }

    /// Bind and serve until the process exits.
    pub async fn run(self) -> Result<(), anyhow::Error> {
        self.run_until(std::future::pending()).await
    }

    /// Bind and serve until `shutdown` resolves.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), anyhow::Error>
    where
        F: Future<Output = ()>,
    {
        let listener = self.bind()?;
        self.serve(listener, shutdown).await
    }

    pub fn bind(&self) -> Result<TcpListener, anyhow::Error> {
        let addr = self.listen.socket_addr();
        create_reusable_listener(addr)
            .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", addr, e))
    }

    /// Accept connections on an already bound listener until `shutdown`
    /// resolves. Connections in flight are left to finish on their own.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), anyhow::Error>
    where
        F: Future<Output = ()>,
    {
        info!("Listening on http://{}", listener.local_addr()?);
        info!(
            "Serving {} registrations",
            self.mockery.dispatcher().routes().len()
        );

        let mockery = self.mockery;
        tokio::pin!(shutdown);

        loop {
            let (stream, remote_addr) = tokio::select! {
                accepted = listener.accept() => accepted?,
                _ = &mut shutdown => {
                    info!("Shutdown requested, no longer accepting connections");
                    return Ok(());
                }
            };
            let mockery = mockery.clone();

            tokio::spawn(async move {
                let io = TokioIo::new(stream);
                let service = service_fn(move |req| {
                    let mockery = mockery.clone();
                    async move { handle_request(&mockery, req).await }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    error!("Error serving HTTP connection from {}: {}", remote_addr, err);
                }
            });
        }
    }
}

async fn handle_request(
    mockery: &Mockery,
    req: Request<Incoming>,
) -> Result<Response<ResponseBody>, Infallible> {
    let (parts, body) = req.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => {
            warn!(method = %parts.method, uri = %parts.uri, error = %err, "failed to read request body");
            let mut w = ResponseWriter::new();
            w.write_header(StatusCode::BAD_REQUEST);
            return Ok(w.into_response());
        }
    };

    let req = MockRequest::from_parts(parts, body);
    let w = mockery.handle(&req).await;
    debug!(
        method = %req.method(),
        uri = %req.uri(),
        status = w.status().as_u16(),
        "request served"
    );
    Ok(w.into_response())
}
