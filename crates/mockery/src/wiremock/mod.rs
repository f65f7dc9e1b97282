//! WireMock mapping import.
//!
//! A mapping directory follows the WireMock layout: stub definitions in
//! `mappings/*.json` and response body files in `__files/`. Each mapping
//! becomes one endpoint registration built purely from the public DSL.

mod types;

pub use types::{
    DelayDistribution, HeaderValues, Mapping, MappingRequest, MappingResponse, ValueCondition,
};

use crate::compose::Composer;
use crate::delay::DelaySpec;
use crate::dispatch::DEFAULT_PRIORITY;
use crate::error::{ConfigError, MappingError};
use crate::predicate::{
    and, compile_pattern, extract_header, extract_query_parameter, method_is, path_equals,
    path_matches, request_uri_equals, request_uri_matches, Extractor, Predicate,
};
use crate::request::MockRequest;
use base64::Engine;
use bytes::Bytes;
use hyper::StatusCode;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Register every `dir/mappings/*.json`, in file-name order.
pub fn wiremock_endpoints(composer: &mut Composer, dir: &Path) -> Result<(), MappingError> {
    let mapping_dir = dir.join("mappings");
    let files_dir = dir.join("__files");

    let io_error = |source| MappingError::Io {
        path: mapping_dir.clone(),
        source,
    };
    let mut files: Vec<PathBuf> = std::fs::read_dir(&mapping_dir)
        .map_err(io_error)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(io_error)?
        .into_iter()
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();

    for file in &files {
        wiremock_endpoint(composer, &files_dir, file)?;
    }
    info!(
        directory = %dir.display(),
        count = files.len(),
        "Loaded WireMock mappings"
    );
    Ok(())
}

/// Register one mapping file. Body files are resolved against `files_dir`.
pub fn wiremock_endpoint(
    composer: &mut Composer,
    files_dir: &Path,
    file: &Path,
) -> Result<(), MappingError> {
    let contents = std::fs::read_to_string(file).map_err(|source| MappingError::Io {
        path: file.to_path_buf(),
        source,
    })?;
    let mapping: Mapping = serde_json::from_str(&contents).map_err(|source| MappingError::Parse {
        path: file.to_path_buf(),
        source,
    })?;
    debug!(file = %file.display(), "registering mapping");
    register_mapping(composer, files_dir, &mapping).map_err(|e| match e {
        MappingSetupError::Config(source) => MappingError::Config {
            path: file.to_path_buf(),
            source,
        },
        MappingSetupError::Base64(source) => MappingError::Base64 {
            path: file.to_path_buf(),
            source,
        },
    })
}

enum MappingSetupError {
    Config(ConfigError),
    Base64(base64::DecodeError),
}

impl From<ConfigError> for MappingSetupError {
    fn from(e: ConfigError) -> Self {
        MappingSetupError::Config(e)
    }
}

enum Body {
    Empty,
    Text(String),
    Bytes(Bytes),
    Json(serde_json::Value),
    File(String),
}

fn register_mapping(
    composer: &mut Composer,
    files_dir: &Path,
    mapping: &Mapping,
) -> Result<(), MappingSetupError> {
    let predicate = request_predicate(&mapping.request)?;
    let response = &mapping.response;

    let status = match response.status {
        Some(code) => StatusCode::from_u16(code).map_err(|_| ConfigError::InvalidStatus(code))?,
        None => StatusCode::OK,
    };
    let body = if let Some(name) = response.body_file_name.as_ref().filter(|s| !s.is_empty()) {
        Body::File(name.clone())
    } else if let Some(text) = response.body.as_ref().filter(|s| !s.is_empty()) {
        Body::Text(text.clone())
    } else if let Some(json) = &response.json_body {
        Body::Json(json.clone())
    } else if let Some(encoded) = response.base64_body.as_ref().filter(|s| !s.is_empty()) {
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(MappingSetupError::Base64)?;
        Body::Bytes(Bytes::from(decoded))
    } else {
        Body::Empty
    };
    let delay = delay_spec(response)?;

    let priority = mapping.priority.unwrap_or(DEFAULT_PRIORITY);
    composer.endpoint_for_condition_with_priority(priority, predicate, |c| {
        for (name, values) in &response.headers {
            for value in values.values() {
                c.header(name, value)?;
            }
        }
        match body {
            Body::File(name) => {
                c.log_location(&format!("Responding with {}", name));
                c.respond_with_file(status, files_dir.join(name));
            }
            Body::Text(text) => c.respond_with_string(status, text),
            Body::Json(json) => c.respond_with_json(status, &json)?,
            Body::Bytes(bytes) => c.respond_with_bytes(status, bytes),
            Body::Empty => c.respond(status),
        }
        if let Some(spec) = &delay {
            c.delay(spec);
        }
        Ok(())
    })?;
    Ok(())
}

fn request_predicate(request: &MappingRequest) -> Result<Predicate<MockRequest>, ConfigError> {
    let mut predicates = Vec::new();

    if let Some(url) = non_empty(&request.url) {
        predicates.push(request_uri_equals(url));
    } else if let Some(pattern) = non_empty(&request.url_pattern) {
        predicates.push(request_uri_matches(compile_pattern(pattern)?));
    } else if let Some(path) = non_empty(&request.url_path) {
        predicates.push(path_equals(path));
    } else if let Some(pattern) = non_empty(&request.url_path_pattern) {
        predicates.push(path_matches(compile_pattern(pattern)?));
    }

    if let Some(method) = non_empty(&request.method) {
        if !method.eq_ignore_ascii_case("ANY") {
            predicates.push(method_is(method));
        }
    }

    for (name, condition) in &request.headers {
        if let Some(p) = value_predicate(condition, extract_header(name), name)? {
            predicates.push(p);
        }
    }
    for (name, condition) in &request.query_parameters {
        if let Some(p) = value_predicate(condition, extract_query_parameter(name), name)? {
            predicates.push(p);
        }
    }

    Ok(and(predicates))
}

fn value_predicate(
    condition: &ValueCondition,
    extractor: Extractor<String>,
    name: &str,
) -> Result<Option<Predicate<MockRequest>>, ConfigError> {
    if condition.binary_equal_to.is_some() {
        warn!(name, "binaryEqualTo conditions are not supported and are ignored");
    }
    match condition.matcher() {
        Some(matcher) => Ok(Some(
            matcher.to_request_predicate(extractor, !condition.case_insensitive)?,
        )),
        None => Ok(None),
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Delay for a response: a distribution when one is given, otherwise a
/// fixed delay.
fn delay_spec(response: &MappingResponse) -> Result<Option<DelaySpec>, ConfigError> {
    match &response.delay_distribution {
        Some(DelayDistribution::Lognormal { median, sigma }) => lognormal(*median, *sigma).map(Some),
        Some(DelayDistribution::Uniform { lower, upper }) => Ok(Some(DelaySpec::Uniform {
            min: Duration::from_millis(*lower),
            max: Duration::from_millis(*upper),
        })),
        Some(DelayDistribution::Unsupported) => {
            warn!("unsupported delayDistribution type ignored");
            Ok(None)
        }
        None => Ok(response
            .fixed_delay_milliseconds
            .map(|ms| DelaySpec::Fixed(Duration::from_millis(ms)))),
    }
}

/// Moment-matched parameters for a WireMock log-normal distribution given
/// its median (ms) and sigma. A sigma whose spread does not fit in a
/// `Duration` is rejected.
fn lognormal(median_ms: u64, sigma: f64) -> Result<DelaySpec, ConfigError> {
    let too_wide = || ConfigError::InvalidDuration {
        parameter: "sigma",
        value: sigma.to_string(),
    };
    let median = Duration::from_millis(median_ms);
    let mu = median.as_secs_f64().ln();
    let variance = (2.0 * mu + sigma * sigma).exp() * ((sigma * sigma).exp() - 1.0);
    let stddev_secs = variance.sqrt();
    let stddev = if stddev_secs == 0.0 {
        Duration::ZERO
    } else {
        Duration::try_from_secs_f64(stddev_secs).map_err(|_| too_wide())?
    };
    let max = stddev
        .checked_mul(5)
        .and_then(|spread| median.checked_add(spread))
        .ok_or_else(too_wide)?;
    Ok(DelaySpec::Normal {
        mean: median,
        stddev,
        max,
    })
}
