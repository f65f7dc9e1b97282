//! Loading WireMock mapping directories into a mock.

use bytes::Bytes;
use hyper::{Method, Request};
use mockery::wiremock::{wiremock_endpoint, wiremock_endpoints};
use mockery::{ConfigError, MappingError, MockRequest, Mockery, StatusCode};
use std::path::Path;
use tempfile::TempDir;

fn mapping_dir(mappings: &[(&str, &str)], files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("mappings")).unwrap();
    std::fs::create_dir(dir.path().join("__files")).unwrap();
    for (name, contents) in mappings {
        std::fs::write(dir.path().join("mappings").join(name), contents).unwrap();
    }
    for (name, contents) in files {
        std::fs::write(dir.path().join("__files").join(name), contents).unwrap();
    }
    dir
}

fn load(dir: &Path) -> Result<Mockery, MappingError> {
    Mockery::try_configure(|c| wiremock_endpoints(c, dir))
}

fn request(method: Method, uri: &str, headers: &[(&str, &str)]) -> MockRequest {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    MockRequest::from(builder.body(Bytes::new()).unwrap())
}

const ORDERS: &str = r#"{
    "request": {
        "method": "GET",
        "urlPath": "/orders",
        "queryParameters": { "id": { "matches": "^[0-9]+$" } },
        "headers": { "Accept": { "contains": "JSON", "caseInsensitive": true } }
    },
    "response": {
        "status": 200,
        "headers": { "X-Source": "wiremock", "X-Multi": ["a", "b"] },
        "jsonBody": { "id": 1, "state": "open" }
    }
}"#;

const FILE_BODY: &str = r#"{
    "request": { "method": "ANY", "url": "/static/page?lang=en" },
    "response": { "status": 200, "bodyFileName": "page.html" }
}"#;

const FALLBACK: &str = r#"{
    "priority": 900,
    "request": { "urlPattern": "/.*" },
    "response": { "status": 503, "body": "maintenance" }
}"#;

#[tokio::test]
async fn test_directory_import() {
    let dir = mapping_dir(
        &[
            ("01-orders.json", ORDERS),
            ("02-page.json", FILE_BODY),
            ("99-fallback.json", FALLBACK),
            ("notes.txt", "not a mapping"),
        ],
        &[("page.html", "<h1>hi</h1>")],
    );
    let mock = load(dir.path()).unwrap();
    assert_eq!(mock.dispatcher().routes().len(), 3);

    let w = mock
        .handle(&request(
            Method::GET,
            "/orders?id=17",
            &[("Accept", "application/json")],
        ))
        .await;
    assert_eq!(w.status(), StatusCode::OK);
    assert_eq!(w.headers().get("x-source").unwrap(), "wiremock");
    assert_eq!(w.headers().get_all("x-multi").iter().count(), 2);
    assert_eq!(w.headers().get("content-type").unwrap(), "application/json");
    let body: serde_json::Value = serde_json::from_slice(w.body()).unwrap();
    assert_eq!(body["state"], "open");

    // Query parameter fails its regex, so the fallback answers.
    let w = mock
        .handle(&request(
            Method::GET,
            "/orders?id=abc",
            &[("Accept", "application/json")],
        ))
        .await;
    assert_eq!(w.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(w.body(), b"maintenance");

    let w = mock
        .handle(&request(Method::DELETE, "/static/page?lang=en", &[]))
        .await;
    assert_eq!(w.status(), StatusCode::OK);
    assert_eq!(w.body(), b"<h1>hi</h1>");
}

#[tokio::test]
async fn test_priority_orders_mappings() {
    let low = r#"{ "priority": 5, "request": { "urlPath": "/p" }, "response": { "body": "five" } }"#;
    let high = r#"{ "priority": 1, "request": { "urlPath": "/p" }, "response": { "body": "one" } }"#;
    let dir = mapping_dir(&[("a.json", low), ("b.json", high)], &[]);
    let mock = load(dir.path()).unwrap();

    let w = mock.handle(&request(Method::GET, "/p", &[])).await;
    assert_eq!(w.body(), b"one");
}

#[tokio::test]
async fn test_base64_body_and_does_not_match() {
    let mapping = r#"{
        "request": {
            "urlPathPattern": "/bin/[a-z]+",
            "headers": { "X-Client": { "doesNotMatch": "^legacy" } }
        },
        "response": { "status": 200, "base64Body": "AAEC/w==" }
    }"#;
    let dir = mapping_dir(&[("bin.json", mapping)], &[]);
    let mock = load(dir.path()).unwrap();

    let w = mock
        .handle(&request(Method::GET, "/bin/blob", &[("X-Client", "modern")]))
        .await;
    assert_eq!(w.status(), StatusCode::OK);
    assert_eq!(w.body(), &[0x00, 0x01, 0x02, 0xff]);

    let w = mock
        .handle(&request(Method::GET, "/bin/blob", &[("X-Client", "legacy-7")]))
        .await;
    assert_eq!(w.status(), StatusCode::NOT_FOUND);
}

#[test]
fn test_missing_mappings_directory() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(load(dir.path()), Err(MappingError::Io { .. })));
}

#[test]
fn test_malformed_mapping_names_file() {
    let dir = mapping_dir(&[("broken.json", "{ not json")], &[]);
    match load(dir.path()) {
        Err(MappingError::Parse { path, .. }) => assert!(path.ends_with("broken.json")),
        Err(other) => panic!("unexpected error {other}"),
        Ok(_) => panic!("broken mapping should not load"),
    }
}

#[test]
fn test_invalid_status_is_rejected() {
    let dir = mapping_dir(
        &[("bad.json", r#"{ "request": {}, "response": { "status": 42 } }"#)],
        &[],
    );
    let file = dir.path().join("mappings").join("bad.json");
    let result = Mockery::try_configure(|c| {
        wiremock_endpoint(c, &dir.path().join("__files"), &file)
    });
    assert!(matches!(
        result,
        Err(MappingError::Config {
            source: ConfigError::InvalidStatus(42),
            ..
        })
    ));
}

#[test]
fn test_invalid_base64_is_rejected() {
    let dir = mapping_dir(
        &[("b64.json", r#"{ "response": { "base64Body": "***" } }"#)],
        &[],
    );
    assert!(matches!(load(dir.path()), Err(MappingError::Base64 { .. })));
}

#[test]
fn test_unrepresentable_lognormal_delay_is_rejected() {
    let mapping = r#"{
        "request": { "urlPath": "/slow" },
        "response": {
            "status": 200,
            "delayDistribution": { "type": "lognormal", "median": 100, "sigma": 10.0 }
        }
    }"#;
    let dir = mapping_dir(&[("slow.json", mapping)], &[]);
    match load(dir.path()) {
        Err(MappingError::Config {
            path,
            source: ConfigError::InvalidDuration { parameter, .. },
        }) => {
            assert!(path.ends_with("slow.json"));
            assert_eq!(parameter, "sigma");
        }
        Err(other) => panic!("unexpected error {other}"),
        Ok(_) => panic!("mapping should not load"),
    }
}

#[tokio::test]
async fn test_lognormal_delay_loads() {
    let mapping = r#"{
        "request": { "urlPath": "/jitter" },
        "response": {
            "status": 204,
            "delayDistribution": { "type": "lognormal", "median": 5, "sigma": 0.1 }
        }
    }"#;
    let dir = mapping_dir(&[("jitter.json", mapping)], &[]);
    let mock = load(dir.path()).unwrap();

    let w = mock.handle(&request(Method::GET, "/jitter", &[])).await;
    assert_eq!(w.status(), StatusCode::NO_CONTENT);
}
