//! Serde model of a WireMock stub mapping file.

use crate::predicate::StringMatcher;
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mapping {
    #[serde(default)]
    pub priority: Option<i32>,
    #[serde(default)]
    pub request: MappingRequest,
    #[serde(default)]
    pub response: MappingResponse,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingRequest {
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub url_pattern: Option<String>,
    #[serde(default)]
    pub url_path: Option<String>,
    #[serde(default)]
    pub url_path_pattern: Option<String>,
    #[serde(default)]
    pub headers: BTreeMap<String, ValueCondition>,
    #[serde(default)]
    pub query_parameters: BTreeMap<String, ValueCondition>,
}

/// Condition on a single header or query parameter value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueCondition {
    #[serde(default)]
    pub equal_to: Option<String>,
    #[serde(default)]
    pub case_insensitive: bool,
    #[serde(default)]
    pub binary_equal_to: Option<String>,
    #[serde(default)]
    pub contains: Option<String>,
    #[serde(default)]
    pub matches: Option<String>,
    #[serde(default)]
    pub does_not_match: Option<String>,
}

impl ValueCondition {
    /// The first operator present, in `equalTo`, `contains`, `matches`,
    /// `doesNotMatch` order.
    pub fn matcher(&self) -> Option<StringMatcher> {
        let non_empty = |v: &Option<String>| v.clone().filter(|s| !s.is_empty());
        non_empty(&self.equal_to)
            .map(StringMatcher::EqualTo)
            .or_else(|| non_empty(&self.contains).map(StringMatcher::Contains))
            .or_else(|| non_empty(&self.matches).map(StringMatcher::Matches))
            .or_else(|| non_empty(&self.does_not_match).map(StringMatcher::DoesNotMatch))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingResponse {
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub status_message: Option<String>,
    #[serde(default)]
    pub headers: BTreeMap<String, HeaderValues>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub json_body: Option<serde_json::Value>,
    #[serde(default)]
    pub base64_body: Option<String>,
    #[serde(default)]
    pub body_file_name: Option<String>,
    #[serde(default)]
    pub fixed_delay_milliseconds: Option<u64>,
    #[serde(default)]
    pub delay_distribution: Option<DelayDistribution>,
}

/// A response header given as one value or a list of values.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum HeaderValues {
    One(String),
    Many(Vec<String>),
}

impl HeaderValues {
    pub fn values(&self) -> &[String] {
        match self {
            HeaderValues::One(v) => std::slice::from_ref(v),
            HeaderValues::Many(vs) => vs,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DelayDistribution {
    Lognormal {
        /// Milliseconds.
        median: u64,
        sigma: f64,
    },
    Uniform {
        /// Milliseconds.
        lower: u64,
        /// Milliseconds.
        upper: u64,
    },
    #[serde(other)]
    Unsupported,
}
