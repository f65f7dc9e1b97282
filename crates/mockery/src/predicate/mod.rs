//! Predicate and extractor algebra for request matching.
//!
//! Predicates are typed: `Predicate<str>` tests a string,
//! `Predicate<MockRequest>` tests a whole request. An [`Extractor`] pulls a
//! value out of the request, and [`extracted_value_accepted`] joins the two,
//! so every request shorthand in this module is one extractor plus one
//! string test.
//!
//! # Module Structure
//!
//! - `logical` - the `Predicate` type, `and`/`or`/`not`, constants
//! - `extractor` - request extractors and `upper_case`
//! - `string_matcher` - string predicates and the serialized `StringMatcher`
//! - `request` - path, URI, method, header and query shorthands
//! - `body_matcher` - XPath over XML bodies

mod body_matcher;
mod extractor;
mod logical;
mod request;
mod string_matcher;

use crate::request::MockRequest;
use std::borrow::Borrow;

pub use body_matcher::{
    body_xpath_equals, body_xpath_equals_ignore_case, body_xpath_matches, extract_xpath,
};
pub use extractor::{
    extract_header, extract_method, extract_path, extract_path_element_by_index,
    extract_query_parameter, extract_request_uri, extract_xpath_string, identity, upper_case,
    Extractor,
};
pub use logical::{always, and, never, not, or, Predicate};
pub use request::{
    header_contains, header_contains_ignore_case, header_equals, header_equals_ignore_case,
    header_matches, header_starts_with, method_is, path_equals, path_matches, path_starts_with,
    query_param_contains, query_param_contains_ignore_case, query_param_equals,
    query_param_equals_ignore_case, query_param_matches, query_param_starts_with,
    request_uri_equals, request_uri_matches, request_uri_starts_with,
};
pub use string_matcher::{
    compile_pattern, string_contains, string_ends_with, string_equals, string_matches,
    string_starts_with, StringMatcher,
};

/// Request predicate that extracts a value and hands it to `predicate`.
///
/// `O` is whatever the extractor produces; `B` is what the predicate
/// borrows. `Extractor<String>` pairs with `Predicate<str>`, and the
/// identity extractor pairs with `Predicate<MockRequest>`.
pub fn extracted_value_accepted<O, B>(
    extractor: Extractor<O>,
    predicate: Predicate<B>,
) -> Predicate<MockRequest>
where
    O: Borrow<B> + 'static,
    B: ?Sized + 'static,
{
    Predicate::new(move |req: &MockRequest| {
        let value = extractor.extract(req);
        predicate.accept(value.borrow())
    })
}
