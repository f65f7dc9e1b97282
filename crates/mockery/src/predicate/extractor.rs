//! Extractors pull a value out of a request for a predicate to test.

use super::body_matcher::{extract_xpath, validate_xpath};
use crate::error::ConfigError;
use crate::request::MockRequest;
use std::fmt;
use std::sync::Arc;

/// Function from a request to a value of type `O`.
pub struct Extractor<O> {
    extract: Arc<dyn Fn(&MockRequest) -> O + Send + Sync>,
}

impl<O: 'static> Extractor<O> {
    pub fn new<F>(extract: F) -> Self
    where
        F: Fn(&MockRequest) -> O + Send + Sync + 'static,
    {
        Self {
            extract: Arc::new(extract),
        }
    }

    #[inline]
    pub fn extract(&self, req: &MockRequest) -> O {
        (self.extract)(req)
    }

    /// Post-process every extracted value.
    pub fn map<P, F>(self, f: F) -> Extractor<P>
    where
        P: 'static,
        F: Fn(O) -> P + Send + Sync + 'static,
    {
        Extractor::new(move |req| f(self.extract(req)))
    }
}

impl<O> Clone for Extractor<O> {
    fn clone(&self) -> Self {
        Self {
            extract: Arc::clone(&self.extract),
        }
    }
}

impl<O> fmt::Debug for Extractor<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Extractor")
    }
}

pub fn extract_path() -> Extractor<String> {
    Extractor::new(|req| req.path().to_string())
}

/// Path plus `?query` when the request carries one.
pub fn extract_request_uri() -> Extractor<String> {
    Extractor::new(|req| req.request_uri())
}

pub fn extract_method() -> Extractor<String> {
    Extractor::new(|req| req.method().as_str().to_string())
}

/// First value of the header, or `""` when absent.
pub fn extract_header(name: &str) -> Extractor<String> {
    let name = name.to_string();
    Extractor::new(move |req| req.header(&name).unwrap_or_default().to_string())
}

/// First value of the query parameter, decoded, or `""` when absent.
pub fn extract_query_parameter(name: &str) -> Extractor<String> {
    let name = name.to_string();
    Extractor::new(move |req| req.query_param(&name).unwrap_or_default())
}

/// Element of the path split on `/`.
///
/// The leading slash produces an empty element 0, so `/foo/bar` has
/// `foo` at 1. Negative indexes count from the end (`-1` is the last
/// element). Anything out of range yields `""`.
pub fn extract_path_element_by_index(index: isize) -> Extractor<String> {
    Extractor::new(move |req| {
        let elements: Vec<&str> = req.path().split('/').collect();
        let resolved = if index < 0 {
            elements.len() as isize + index
        } else {
            index
        };
        usize::try_from(resolved)
            .ok()
            .and_then(|i| elements.get(i))
            .map(|s| s.to_string())
            .unwrap_or_default()
    })
}

/// String value of an XPath expression over the body parsed as XML.
///
/// The expression is checked once here. At request time a body that is
/// empty or not XML, or an expression that selects nothing, yields `""`.
pub fn extract_xpath_string(xpath: &str) -> Result<Extractor<String>, ConfigError> {
    validate_xpath(xpath)?;
    let xpath = xpath.to_string();
    Ok(Extractor::new(move |req| {
        std::str::from_utf8(req.body())
            .ok()
            .and_then(|body| extract_xpath(body, &xpath))
            .unwrap_or_default()
    }))
}

/// The request itself.
pub fn identity() -> Extractor<MockRequest> {
    Extractor::new(|req| req.clone())
}

pub fn upper_case(extractor: Extractor<String>) -> Extractor<String> {
    extractor.map(|s| s.to_uppercase())
}
