//! String predicates and the declarative string matcher.
//!
//! The free functions build `Predicate<str>` values directly from Rust code.
//! [`StringMatcher`] is the serialized form used by mapping files; it compiles
//! to the same predicates.

use super::extractor::{upper_case, Extractor};
use super::logical::{not, Predicate};
use super::extracted_value_accepted;
use crate::error::ConfigError;
use crate::request::MockRequest;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub fn string_equals(literal: &str) -> Predicate<str> {
    let literal = literal.to_string();
    Predicate::new(move |v: &str| v == literal)
}

pub fn string_contains(needle: &str) -> Predicate<str> {
    let needle = needle.to_string();
    Predicate::new(move |v: &str| v.contains(needle.as_str()))
}

pub fn string_starts_with(prefix: &str) -> Predicate<str> {
    let prefix = prefix.to_string();
    Predicate::new(move |v: &str| v.starts_with(prefix.as_str()))
}

pub fn string_ends_with(suffix: &str) -> Predicate<str> {
    let suffix = suffix.to_string();
    Predicate::new(move |v: &str| v.ends_with(suffix.as_str()))
}

/// Unanchored regex search, like `Regex::is_match`.
pub fn string_matches(regex: Regex) -> Predicate<str> {
    Predicate::new(move |v: &str| regex.is_match(v))
}

/// Compile a pattern, reporting failures as configuration errors.
pub fn compile_pattern(pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// String matching operator as it appears in mapping files.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum StringMatcher {
    EqualTo(String),
    Contains(String),
    StartsWith(String),
    EndsWith(String),
    Matches(String),
    DoesNotMatch(String),
}

impl StringMatcher {
    /// Compile into a string predicate.
    pub fn compile(&self) -> Result<Predicate<str>, ConfigError> {
        Ok(match self {
            StringMatcher::EqualTo(v) => string_equals(v),
            StringMatcher::Contains(v) => string_contains(v),
            StringMatcher::StartsWith(v) => string_starts_with(v),
            StringMatcher::EndsWith(v) => string_ends_with(v),
            StringMatcher::Matches(p) => string_matches(compile_pattern(p)?),
            StringMatcher::DoesNotMatch(p) => not(string_matches(compile_pattern(p)?)),
        })
    }

    /// Apply this matcher to the output of `extractor`.
    ///
    /// When `case_sensitive` is false, literal operators compare upper-cased
    /// values on both sides. Regex operators are left alone; use `(?i)` in
    /// the pattern instead.
    pub fn to_request_predicate(
        &self,
        extractor: Extractor<String>,
        case_sensitive: bool,
    ) -> Result<Predicate<MockRequest>, ConfigError> {
        if case_sensitive {
            return Ok(extracted_value_accepted(extractor, self.compile()?));
        }
        let folded = match self {
            StringMatcher::EqualTo(v) => StringMatcher::EqualTo(v.to_uppercase()),
            StringMatcher::Contains(v) => StringMatcher::Contains(v.to_uppercase()),
            StringMatcher::StartsWith(v) => StringMatcher::StartsWith(v.to_uppercase()),
            StringMatcher::EndsWith(v) => StringMatcher::EndsWith(v.to_uppercase()),
            regex => return Ok(extracted_value_accepted(extractor, regex.compile()?)),
        };
        Ok(extracted_value_accepted(
            upper_case(extractor),
            folded.compile()?,
        ))
    }
}
