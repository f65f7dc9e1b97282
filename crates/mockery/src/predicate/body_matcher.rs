//! XML body matching via XPath.

use super::extractor::{extract_xpath_string, upper_case};
use super::logical::Predicate;
use super::string_matcher::{string_equals, string_matches};
use super::extracted_value_accepted;
use crate::error::ConfigError;
use crate::request::MockRequest;
use regex::Regex;

/// Evaluate an XPath expression against an XML string.
///
/// Node-sets yield the string value of their first node. Returns `None`
/// when the body is not XML, evaluation fails, or nothing is selected.
pub fn extract_xpath(body: &str, path: &str) -> Option<String> {
    use sxd_document::parser;
    use sxd_xpath::{evaluate_xpath, Value};

    let package = parser::parse(body).ok()?;
    let document = package.as_document();

    match evaluate_xpath(&document, path) {
        Ok(value) => match value {
            Value::String(s) => Some(s),
            Value::Number(n) => {
                if n.fract() == 0.0 {
                    Some(format!("{}", n as i64))
                } else {
                    Some(n.to_string())
                }
            }
            Value::Boolean(b) => Some(b.to_string()),
            Value::Nodeset(nodes) => nodes.document_order_first().map(|node| node.string_value()),
        },
        Err(_) => None,
    }
}

/// Reject expressions that do not parse.
///
/// Evaluated against an empty document so that syntax and unknown
/// functions both surface at configuration time.
pub(crate) fn validate_xpath(path: &str) -> Result<(), ConfigError> {
    let package = sxd_document::Package::new();
    let document = package.as_document();
    sxd_xpath::evaluate_xpath(&document, path)
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidXPath {
            expression: path.to_string(),
            message: e.to_string(),
        })
}

pub fn body_xpath_equals(xpath: &str, value: &str) -> Result<Predicate<MockRequest>, ConfigError> {
    Ok(extracted_value_accepted(
        extract_xpath_string(xpath)?,
        string_equals(value),
    ))
}

pub fn body_xpath_equals_ignore_case(
    xpath: &str,
    value: &str,
) -> Result<Predicate<MockRequest>, ConfigError> {
    Ok(extracted_value_accepted(
        upper_case(extract_xpath_string(xpath)?),
        string_equals(&value.to_uppercase()),
    ))
}

pub fn body_xpath_matches(xpath: &str, regex: Regex) -> Result<Predicate<MockRequest>, ConfigError> {
    Ok(extracted_value_accepted(
        extract_xpath_string(xpath)?,
        string_matches(regex),
    ))
}
