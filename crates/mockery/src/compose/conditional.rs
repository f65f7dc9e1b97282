//! Branching DSL: `when` and `switch`.

use super::Composer;
use crate::error::ConfigError;
use crate::handler::{Handler, ResponseWriter, SharedHandler};
use crate::predicate::{string_equals, Extractor, Predicate};
use crate::request::MockRequest;
use async_trait::async_trait;
use hyper::StatusCode;
use std::borrow::Borrow;
use std::sync::Arc;
use tracing::trace;

impl Composer {
    /// Branch on `predicate`. Both branches start from the handler built
    /// so far and cannot see each other's decorations.
    pub fn when<T, F>(
        &mut self,
        predicate: Predicate<MockRequest>,
        on_true: T,
        on_false: F,
    ) -> Result<(), ConfigError>
    where
        T: FnOnce(&mut Composer) -> Result<(), ConfigError>,
        F: FnOnce(&mut Composer) -> Result<(), ConfigError>,
    {
        let outer = self.current();
        let on_true = self.scoped(Arc::clone(&outer), on_true)?;
        let on_false = self.scoped(outer, on_false)?;
        self.replace(Arc::new(When {
            predicate,
            on_true,
            on_false,
        }));
        Ok(())
    }

    /// Branch on the string `extractor` pulls out of the request.
    ///
    /// Cases are tried in declaration order and the first match wins. The
    /// default, if any, is tried last. With no match and no default, the
    /// handler built before the switch runs and the response is a 404.
    pub fn switch<F>(&mut self, extractor: Extractor<String>, f: F) -> Result<(), ConfigError>
    where
        F: FnOnce(&mut Cases<'_, str>) -> Result<(), ConfigError>,
    {
        self.switch_on(extractor, f)
    }

    /// [`switch`](Self::switch) over any extracted value, with cases tested
    /// against its borrowed form `B`, e.g. `identity()` with request
    /// predicates.
    pub fn switch_on<O, B, F>(&mut self, extractor: Extractor<O>, f: F) -> Result<(), ConfigError>
    where
        O: Borrow<B> + Send + 'static,
        B: ?Sized + 'static,
        F: FnOnce(&mut Cases<'_, B>) -> Result<(), ConfigError>,
    {
        let outer = self.current();
        let mut cases = Cases {
            composer: &mut *self,
            outer: Arc::clone(&outer),
            cases: Vec::new(),
            default: None,
        };
        f(&mut cases)?;
        let Cases { cases, default, .. } = cases;

        let default = default.unwrap_or_else(|| Arc::new(NotFoundAfter { previous: outer }));
        self.replace(Arc::new(Switch {
            extractor,
            cases,
            default,
        }));
        Ok(())
    }
}

/// Case set handed to a `switch` (or `endpoint`) closure.
pub struct Cases<'a, B: ?Sized> {
    composer: &'a mut Composer,
    outer: SharedHandler,
    cases: Vec<(Predicate<B>, SharedHandler)>,
    default: Option<SharedHandler>,
}

impl<B: ?Sized + 'static> Cases<'_, B> {
    pub fn case<F>(&mut self, predicate: Predicate<B>, f: F) -> Result<(), ConfigError>
    where
        F: FnOnce(&mut Composer) -> Result<(), ConfigError>,
    {
        let handler = self.composer.scoped(Arc::clone(&self.outer), f)?;
        self.cases.push((predicate, handler));
        Ok(())
    }

    /// Fallback for keys no case accepts. At most one per switch.
    pub fn default<F>(&mut self, f: F) -> Result<(), ConfigError>
    where
        F: FnOnce(&mut Composer) -> Result<(), ConfigError>,
    {
        if self.default.is_some() {
            return Err(ConfigError::DuplicateDefault);
        }
        let handler = self.composer.scoped(Arc::clone(&self.outer), f)?;
        self.default = Some(handler);
        Ok(())
    }
}

impl Cases<'_, str> {
    /// Case matching the request method exactly, e.g. `"GET"`.
    pub fn method<F>(&mut self, name: &str, f: F) -> Result<(), ConfigError>
    where
        F: FnOnce(&mut Composer) -> Result<(), ConfigError>,
    {
        self.case(string_equals(name), f)
    }
}

struct When {
    predicate: Predicate<MockRequest>,
    on_true: SharedHandler,
    on_false: SharedHandler,
}

#[async_trait]
impl Handler for When {
    async fn serve(&self, req: &MockRequest, w: &mut ResponseWriter) {
        if self.predicate.accept(req) {
            self.on_true.serve(req, w).await;
        } else {
            self.on_false.serve(req, w).await;
        }
    }
}

struct Switch<O, B: ?Sized> {
    extractor: Extractor<O>,
    cases: Vec<(Predicate<B>, SharedHandler)>,
    default: SharedHandler,
}

#[async_trait]
impl<O, B> Handler for Switch<O, B>
where
    O: Borrow<B> + Send + 'static,
    B: ?Sized + 'static,
{
    async fn serve(&self, req: &MockRequest, w: &mut ResponseWriter) {
        let handler = {
            let key = self.extractor.extract(req);
            let key: &B = key.borrow();
            match self.cases.iter().find(|(predicate, _)| predicate.accept(key)) {
                Some((_, handler)) => handler,
                None => &self.default,
            }
        };
        handler.serve(req, w).await;
    }
}

/// Switch fallback when no default was declared.
struct NotFoundAfter {
    previous: SharedHandler,
}

#[async_trait]
impl Handler for NotFoundAfter {
    async fn serve(&self, req: &MockRequest, w: &mut ResponseWriter) {
        self.previous.serve(req, w).await;
        trace!(uri = %req.uri(), "no case matched");
        w.write_header(StatusCode::NOT_FOUND);
    }
}
