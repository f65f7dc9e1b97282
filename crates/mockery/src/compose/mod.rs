//! Configuration-time handler composition.
//!
//! A [`Composer`] is threaded through every configuration closure. It keeps
//! a stack of [`Composition`] frames: the top frame is the handler currently
//! under construction. DSL calls either wrap that handler in a (pre, post)
//! layer or replace it outright. Nested scopes (endpoints, cases, branches)
//! push a fresh frame and pop it again when the scope ends, whether it ends
//! normally, with an error, or by panicking.
//!
//! ```
//! use mockery::{Mockery, StatusCode};
//!
//! let mock = Mockery::configure(|c| {
//!     c.endpoint("/foo/bar", |methods| {
//!         methods.method("GET", |c| {
//!             c.header("FOO", "BAR")?;
//!             c.respond_with_string(StatusCode::OK, "hello");
//!             Ok(())
//!         })
//!     })
//! })
//! .unwrap();
//! # let _ = mock;
//! ```

mod actions;
mod conditional;

pub use conditional::Cases;

use crate::dispatch::{Dispatcher, Registry, DEFAULT_PRIORITY};
use crate::error::ConfigError;
use crate::handler::{noop, Decorated, Handler, ResponseWriter, SharedHandler};
use crate::predicate::{compile_pattern, extract_method, path_matches, Predicate};
use crate::request::MockRequest;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use tracing::debug;

/// A handler under construction: a core plus (pre, post) layers.
///
/// Layers nest in declaration order, so the last one declared is the
/// outermost: its `pre` runs first and its `post` runs last.
#[derive(Clone)]
pub struct Composition {
    core: SharedHandler,
    layers: Vec<Layer>,
}

#[derive(Clone)]
struct Layer {
    pre: Option<SharedHandler>,
    post: Option<SharedHandler>,
}

impl Composition {
    pub fn new(core: SharedHandler) -> Self {
        Self {
            core,
            layers: Vec::new(),
        }
    }

    pub fn decorate(&mut self, pre: Option<SharedHandler>, post: Option<SharedHandler>) {
        self.layers.push(Layer { pre, post });
    }

    pub fn replace(&mut self, core: SharedHandler) {
        self.core = core;
        self.layers.clear();
    }

    pub fn build(&self) -> SharedHandler {
        self.layers.iter().fold(Arc::clone(&self.core), |inner, layer| {
            Arc::new(Decorated::new(layer.pre.clone(), inner, layer.post.clone()))
        })
    }
}

/// The explicit configuration context.
pub struct Composer {
    root: Composition,
    nested: Vec<Composition>,
    registry: Registry,
}

impl Default for Composer {
    fn default() -> Self {
        Self::new()
    }
}

impl Composer {
    pub fn new() -> Self {
        Self {
            root: Composition::new(noop()),
            nested: Vec::new(),
            registry: Registry::new(),
        }
    }

    fn frame(&self) -> &Composition {
        self.nested.last().unwrap_or(&self.root)
    }

    fn frame_mut(&mut self) -> &mut Composition {
        match self.nested.last_mut() {
            Some(frame) => frame,
            None => &mut self.root,
        }
    }

    /// The handler as built so far in the current scope.
    pub fn current(&self) -> SharedHandler {
        self.frame().build()
    }

    /// Wrap the current handler so it runs `pre; current; post`.
    pub fn decorate(&mut self, pre: Option<SharedHandler>, post: Option<SharedHandler>) {
        self.frame_mut().decorate(pre, post);
    }

    /// Replace the current handler, discarding its layers.
    pub fn replace(&mut self, handler: SharedHandler) {
        self.frame_mut().replace(handler);
    }

    /// Nesting depth; 0 at the top level.
    pub fn depth(&self) -> usize {
        self.nested.len()
    }

    /// Run `f` in a new frame starting from `start` and return what it built.
    pub(crate) fn scoped<F>(&mut self, start: SharedHandler, f: F) -> Result<SharedHandler, ConfigError>
    where
        F: FnOnce(&mut Composer) -> Result<(), ConfigError>,
    {
        let mut scope = Scope::enter(self, Composition::new(start));
        f(&mut *scope)?;
        Ok(scope.current())
    }

    /// Register `handler` directly with the dispatcher.
    pub fn register(
        &mut self,
        priority: i32,
        predicate: Predicate<MockRequest>,
        handler: SharedHandler,
    ) {
        self.registry.register(priority, predicate, handler);
    }

    /// Endpoint on an exact path (or a subtree for paths ending in `/`),
    /// branching on the request method.
    ///
    /// Methods without a case answer 404.
    pub fn endpoint<F>(&mut self, path: &str, f: F) -> Result<(), ConfigError>
    where
        F: FnOnce(&mut Cases<'_, str>) -> Result<(), ConfigError>,
    {
        let start = self.current();
        let handler = self.scoped(start, |c| c.switch(extract_method(), f))?;
        self.registry.register_path(path, handler)
    }

    /// Endpoint for every path matching `pattern`.
    pub fn endpoint_pattern<F>(&mut self, pattern: &str, f: F) -> Result<(), ConfigError>
    where
        F: FnOnce(&mut Composer) -> Result<(), ConfigError>,
    {
        let regex = compile_pattern(pattern)?;
        self.endpoint_for_condition(path_matches(regex), f)
    }

    pub fn endpoint_for_condition<F>(
        &mut self,
        predicate: Predicate<MockRequest>,
        f: F,
    ) -> Result<(), ConfigError>
    where
        F: FnOnce(&mut Composer) -> Result<(), ConfigError>,
    {
        self.endpoint_for_condition_with_priority(DEFAULT_PRIORITY, predicate, f)
    }

    pub fn endpoint_for_condition_with_priority<F>(
        &mut self,
        priority: i32,
        predicate: Predicate<MockRequest>,
        f: F,
    ) -> Result<(), ConfigError>
    where
        F: FnOnce(&mut Composer) -> Result<(), ConfigError>,
    {
        let start = self.current();
        let handler = self.scoped(start, f)?;
        self.registry.register(priority, predicate, handler);
        Ok(())
    }

    /// Freeze everything registered so far.
    pub fn finish(self) -> Mockery {
        debug!(registrations = self.registry.len(), "mock configured");
        Mockery {
            dispatcher: Arc::new(self.registry.finish()),
        }
    }
}

/// Pushes a frame on entry and truncates back to it on drop.
struct Scope<'a> {
    composer: &'a mut Composer,
    depth: usize,
}

impl<'a> Scope<'a> {
    fn enter(composer: &'a mut Composer, frame: Composition) -> Self {
        let depth = composer.nested.len();
        composer.nested.push(frame);
        Self { composer, depth }
    }
}

impl Deref for Scope<'_> {
    type Target = Composer;

    fn deref(&self) -> &Composer {
        self.composer
    }
}

impl DerefMut for Scope<'_> {
    fn deref_mut(&mut self) -> &mut Composer {
        self.composer
    }
}

impl Drop for Scope<'_> {
    fn drop(&mut self) {
        self.composer.nested.truncate(self.depth);
    }
}

/// A configured mock: the frozen dispatcher behind a cheap handle.
#[derive(Clone)]
pub struct Mockery {
    dispatcher: Arc<Dispatcher>,
}

impl Mockery {
    /// Build a mock from a configuration closure.
    pub fn configure<F>(f: F) -> Result<Self, ConfigError>
    where
        F: FnOnce(&mut Composer) -> Result<(), ConfigError>,
    {
        Self::try_configure(f)
    }

    /// Like [`Mockery::configure`] for closures with their own error type.
    pub fn try_configure<F, E>(f: F) -> Result<Self, E>
    where
        F: FnOnce(&mut Composer) -> Result<(), E>,
    {
        let mut composer = Composer::new();
        f(&mut composer)?;
        Ok(composer.finish())
    }

    pub async fn handle(&self, req: &MockRequest) -> ResponseWriter {
        self.dispatcher.dispatch(req).await
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// The whole mock as a single handler, e.g. to mount it inside another
    /// mock with [`Composer::register`].
    pub fn as_handler(&self) -> SharedHandler {
        Arc::clone(&self.dispatcher) as Arc<dyn Handler>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{handler_fn, respond};
    use bytes::Bytes;
    use hyper::{Request, StatusCode};
    use std::panic::{catch_unwind, AssertUnwindSafe};

    fn get(uri: &str) -> MockRequest {
        Request::builder().uri(uri).body(Bytes::new()).unwrap().into()
    }

    fn tag(t: &'static str) -> SharedHandler {
        handler_fn(move |_, w| w.write(t.as_bytes()))
    }

    #[tokio::test]
    async fn test_layers_nest_last_outermost() {
        let mut comp = Composition::new(tag("core "));
        comp.decorate(Some(tag("pre1 ")), Some(tag("post1 ")));
        comp.decorate(Some(tag("pre2 ")), Some(tag("post2 ")));
        comp.decorate(Some(tag("pre3 ")), None);
        let w = respond(comp.build().as_ref(), &get("/")).await;
        assert_eq!(
            std::str::from_utf8(w.body()).unwrap(),
            "pre3 pre2 pre1 core post1 post2 "
        );
    }

    #[tokio::test]
    async fn test_replace_discards_layers() {
        let mut comp = Composition::new(tag("old"));
        comp.decorate(Some(tag("pre")), None);
        comp.replace(tag("new"));
        let w = respond(comp.build().as_ref(), &get("/")).await;
        assert_eq!(w.body(), b"new");
    }

    #[test]
    fn test_scope_restores_on_error() {
        let mut c = Composer::new();
        let result = c.scoped(noop(), |inner| {
            assert_eq!(inner.depth(), 1);
            Err(ConfigError::DuplicateDefault)
        });
        assert!(result.is_err());
        assert_eq!(c.depth(), 0);
    }

    #[test]
    fn test_scope_restores_on_panic() {
        let mut c = Composer::new();
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            let _ = c.scoped(noop(), |_| panic!("boom"));
        }));
        assert!(outcome.is_err());
        assert_eq!(c.depth(), 0);
    }

    #[tokio::test]
    async fn test_scope_does_not_leak_decorations() {
        let mut c = Composer::new();
        c.scoped(noop(), |inner| {
            inner.decorate(Some(tag("inner")), None);
            Ok(())
        })
        .unwrap();
        let w = respond(c.current().as_ref(), &get("/")).await;
        assert!(w.body().is_empty());
    }

    #[tokio::test]
    async fn test_endpoint_for_condition_with_priority() {
        let mock = Mockery::configure(|c| {
            c.endpoint_for_condition_with_priority(2, crate::predicate::always(), |c| {
                c.respond(StatusCode::ACCEPTED);
                Ok(())
            })?;
            c.endpoint_for_condition_with_priority(1, crate::predicate::always(), |c| {
                c.respond(StatusCode::CREATED);
                Ok(())
            })
        })
        .unwrap();
        assert_eq!(mock.handle(&get("/")).await.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_endpoint_pattern() {
        let mock = Mockery::configure(|c| {
            c.endpoint_pattern(r"^/users/\d+$", |c| {
                c.respond_with_string(StatusCode::OK, "user");
                Ok(())
            })
        })
        .unwrap();
        assert_eq!(mock.handle(&get("/users/42")).await.body(), b"user");
        assert_eq!(
            mock.handle(&get("/users/abc")).await.status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_endpoint_pattern_invalid_regex() {
        let err = Mockery::configure(|c| c.endpoint_pattern("(", |_| Ok(()))).err();
        assert!(matches!(err, Some(ConfigError::InvalidPattern { .. })));
    }

    #[tokio::test]
    async fn test_mock_mounts_inside_another() {
        let inner = Mockery::configure(|c| {
            c.endpoint("/inner", |m| {
                m.method("GET", |c| {
                    c.respond_with_string(StatusCode::OK, "inner");
                    Ok(())
                })
            })
        })
        .unwrap();

        let direct = respond(inner.as_handler().as_ref(), &get("/inner")).await;
        assert_eq!(direct.body(), b"inner");

        let outer = Mockery::configure(|c| {
            c.register(
                1,
                crate::predicate::path_starts_with("/inner"),
                inner.as_handler(),
            );
            c.endpoint_for_condition(crate::predicate::always(), |c| {
                c.respond_with_string(StatusCode::OK, "outer");
                Ok(())
            })
        })
        .unwrap();
        assert_eq!(outer.handle(&get("/inner")).await.body(), b"inner");
        assert_eq!(
            outer.handle(&get("/inner/deeper")).await.status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(outer.handle(&get("/else")).await.body(), b"outer");
    }
}
