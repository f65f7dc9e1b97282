//! Request predicate shorthands.
//!
//! Each one is an extractor paired with a string predicate. The
//! `_ignore_case` variants upper-case the extracted value and compare it
//! against a literal that was upper-cased once, up front.

use super::extracted_value_accepted;
use super::extractor::{
    extract_header, extract_method, extract_path, extract_query_parameter, extract_request_uri,
    upper_case,
};
use super::logical::Predicate;
use super::string_matcher::{
    string_contains, string_equals, string_matches, string_starts_with,
};
use crate::request::MockRequest;
use regex::Regex;

type RequestPredicate = Predicate<MockRequest>;

pub fn path_equals(path: &str) -> RequestPredicate {
    extracted_value_accepted(extract_path(), string_equals(path))
}

pub fn path_starts_with(prefix: &str) -> RequestPredicate {
    extracted_value_accepted(extract_path(), string_starts_with(prefix))
}

pub fn path_matches(regex: Regex) -> RequestPredicate {
    extracted_value_accepted(extract_path(), string_matches(regex))
}

pub fn request_uri_equals(uri: &str) -> RequestPredicate {
    extracted_value_accepted(extract_request_uri(), string_equals(uri))
}

pub fn request_uri_starts_with(prefix: &str) -> RequestPredicate {
    extracted_value_accepted(extract_request_uri(), string_starts_with(prefix))
}

pub fn request_uri_matches(regex: Regex) -> RequestPredicate {
    extracted_value_accepted(extract_request_uri(), string_matches(regex))
}

/// Case-insensitive method comparison.
pub fn method_is(method: &str) -> RequestPredicate {
    extracted_value_accepted(
        upper_case(extract_method()),
        string_equals(&method.to_uppercase()),
    )
}

pub fn header_equals(name: &str, value: &str) -> RequestPredicate {
    extracted_value_accepted(extract_header(name), string_equals(value))
}

pub fn header_equals_ignore_case(name: &str, value: &str) -> RequestPredicate {
    extracted_value_accepted(
        upper_case(extract_header(name)),
        string_equals(&value.to_uppercase()),
    )
}

pub fn header_contains(name: &str, value: &str) -> RequestPredicate {
    extracted_value_accepted(extract_header(name), string_contains(value))
}

pub fn header_contains_ignore_case(name: &str, value: &str) -> RequestPredicate {
    extracted_value_accepted(
        upper_case(extract_header(name)),
        string_contains(&value.to_uppercase()),
    )
}

pub fn header_starts_with(name: &str, prefix: &str) -> RequestPredicate {
    extracted_value_accepted(extract_header(name), string_starts_with(prefix))
}

pub fn header_matches(name: &str, regex: Regex) -> RequestPredicate {
    extracted_value_accepted(extract_header(name), string_matches(regex))
}

pub fn query_param_equals(name: &str, value: &str) -> RequestPredicate {
    extracted_value_accepted(extract_query_parameter(name), string_equals(value))
}

pub fn query_param_equals_ignore_case(name: &str, value: &str) -> RequestPredicate {
    extracted_value_accepted(
        upper_case(extract_query_parameter(name)),
        string_equals(&value.to_uppercase()),
    )
}

pub fn query_param_contains(name: &str, value: &str) -> RequestPredicate {
    extracted_value_accepted(extract_query_parameter(name), string_contains(value))
}

pub fn query_param_contains_ignore_case(name: &str, value: &str) -> RequestPredicate {
    extracted_value_accepted(
        upper_case(extract_query_parameter(name)),
        string_contains(&value.to_uppercase()),
    )
}

pub fn query_param_starts_with(name: &str, prefix: &str) -> RequestPredicate {
    extracted_value_accepted(extract_query_parameter(name), string_starts_with(prefix))
}

pub fn query_param_matches(name: &str, regex: Regex) -> RequestPredicate {
    extracted_value_accepted(extract_query_parameter(name), string_matches(regex))
}
