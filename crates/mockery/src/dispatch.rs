//! Priority-ordered request dispatch.
//!
//! Registrations are collected in a [`Registry`] while the mock is being
//! configured and frozen into a [`Dispatcher`] afterwards. Dispatch walks the
//! registrations once, lowest priority first, and hands the request to the
//! first handler whose predicate accepts it. Equal priorities keep their
//! registration order.

use crate::error::ConfigError;
use crate::handler::{Handler, ResponseWriter, SharedHandler};
use crate::predicate::Predicate;
use crate::request::MockRequest;
use async_trait::async_trait;
use hyper::StatusCode;
use std::sync::Arc;
use tracing::debug;

/// Priority used by every registration that does not name one.
pub const DEFAULT_PRIORITY: i32 = 100;

#[derive(Clone)]
pub struct Registration {
    pub priority: i32,
    pub predicate: Predicate<MockRequest>,
    pub handler: SharedHandler,
}

enum Slot {
    Handler(Registration),
    /// Placeholder for the path multiplexer, filled in by `finish`.
    Mux,
}

/// Registrations under construction.
#[derive(Default)]
pub struct Registry {
    slots: Vec<(i32, Slot)>,
    mux: PathMuxBuilder,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        priority: i32,
        predicate: Predicate<MockRequest>,
        handler: SharedHandler,
    ) {
        self.slots.push((
            priority,
            Slot::Handler(Registration {
                priority,
                predicate,
                handler,
            }),
        ));
    }

    /// Route `pattern` through the shared path multiplexer. The
    /// multiplexer itself is registered at [`DEFAULT_PRIORITY`] the first
    /// time this is called.
    pub fn register_path(
        &mut self,
        pattern: &str,
        handler: SharedHandler,
    ) -> Result<(), ConfigError> {
        if self.mux.is_empty() {
            self.slots.push((DEFAULT_PRIORITY, Slot::Mux));
        }
        self.mux.insert(pattern, handler)
    }

    /// Registrations so far, counting the path multiplexer once.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Freeze into a dispatcher.
    pub fn finish(self) -> Dispatcher {
        let mux = Arc::new(self.mux.build());
        let mut routes: Vec<Registration> = self
            .slots
            .into_iter()
            .map(|(priority, slot)| match slot {
                Slot::Handler(registration) => registration,
                Slot::Mux => {
                    let lookup = Arc::clone(&mux);
                    Registration {
                        priority,
                        predicate: Predicate::new(move |req: &MockRequest| {
                            lookup.lookup(req.path()).is_some()
                        }),
                        handler: Arc::clone(&mux) as SharedHandler,
                    }
                }
            })
            .collect();
        // Vec::sort_by_key is stable
        routes.sort_by_key(|r| r.priority);
        Dispatcher { routes }
    }
}

/// Immutable, ordered set of registrations.
pub struct Dispatcher {
    routes: Vec<Registration>,
}

impl Dispatcher {
    pub async fn dispatch(&self, req: &MockRequest) -> ResponseWriter {
        let mut w = ResponseWriter::new();
        self.serve(req, &mut w).await;
        w
    }

    pub fn routes(&self) -> &[Registration] {
        &self.routes
    }
}

#[async_trait]
impl Handler for Dispatcher {
    async fn serve(&self, req: &MockRequest, w: &mut ResponseWriter) {
        match self.routes.iter().position(|r| r.predicate.accept(req)) {
            Some(index) => {
                let route = &self.routes[index];
                debug!(
                    method = %req.method(),
                    uri = %req.uri(),
                    index,
                    priority = route.priority,
                    "request matched"
                );
                route.handler.serve(req, w).await;
            }
            None => {
                debug!(method = %req.method(), uri = %req.uri(), "no registration matched");
                w.write_header(StatusCode::NOT_FOUND);
            }
        }
    }
}

#[derive(Default)]
struct PathMuxBuilder {
    routes: Vec<(String, SharedHandler)>,
}

impl PathMuxBuilder {
    fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    fn insert(&mut self, pattern: &str, handler: SharedHandler) -> Result<(), ConfigError> {
        if self.routes.iter().any(|(p, _)| p == pattern) {
            return Err(ConfigError::DuplicateEndpoint(pattern.to_string()));
        }
        self.routes.push((pattern.to_string(), handler));
        Ok(())
    }

    fn build(self) -> PathMux {
        PathMux {
            routes: self.routes,
        }
    }
}

/// Path-keyed multiplexer shared by all path endpoints.
///
/// A pattern without a trailing `/` matches only that path. A pattern
/// ending in `/` matches every path below it. The longest match wins.
pub struct PathMux {
    routes: Vec<(String, SharedHandler)>,
}

impl PathMux {
    pub fn lookup(&self, path: &str) -> Option<&SharedHandler> {
        self.routes
            .iter()
            .filter(|(pattern, _)| pattern_matches(pattern, path))
            .max_by_key(|(pattern, _)| pattern.len())
            .map(|(_, handler)| handler)
    }
}

fn pattern_matches(pattern: &str, path: &str) -> bool {
    if pattern.ends_with('/') {
        path.starts_with(pattern)
    } else {
        pattern == path
    }
}

#[async_trait]
impl Handler for PathMux {
    async fn serve(&self, req: &MockRequest, w: &mut ResponseWriter) {
        match self.lookup(req.path()) {
            Some(handler) => handler.serve(req, w).await,
            None => w.write_header(StatusCode::NOT_FOUND),
        }
    }
}
