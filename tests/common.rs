#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response, StatusCode};
use axum::Router;
use figment::providers::{Format, Yaml};
use tower::ServiceExt;
use webmetric::config::{base_figment, extract_config, ConfigV1};
use webmetric::metrics::Metrics;
use webmetric::startup::build_app;

pub const TEST_CONFIG: &str = r#"
version: "1.0.0"
logging:
  level: "debug"
  format: "json"
bind_address: 127.0.0.1:0
metrics:
  path: /metrics
  request_tags: true
"#;

pub fn load_test_config(yaml: &str) -> ConfigV1 {
    extract_config(base_figment().merge(Yaml::string(yaml)))
        .expect("Failed to parse test config YAML")
}

pub fn build_test_app(config: ConfigV1) -> (Router, Metrics) {
    build_app(Arc::new(config)).expect("app should build")
}

pub fn get(path: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(path)
        .body(Body::empty())
        .expect("failed to build request")
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    String::from_utf8(bytes.to_vec()).expect("body should be UTF-8")
}

/// Scrapes the metrics endpoint and returns the exposition text.
pub async fn scrape(app: &Router, path: &str) -> String {
    let response = app
        .clone()
        .oneshot(get(path))
        .await
        .expect("scrape should complete");
    assert_eq!(response.status(), StatusCode::OK);
    body_string(response).await
}

/// Sample lines of `metric` (exact name, labelled) that contain every fragment in `labels`.
pub fn samples<'a>(exposition: &'a str, metric: &str, labels: &[&str]) -> Vec<&'a str> {
    let prefix = format!("{metric}{{");
    exposition
        .lines()
        .filter(|line| line.starts_with(&prefix))
        .filter(|line| labels.iter().all(|l| line.contains(l)))
        .collect()
}

/// Value of the single sample of `metric` matching `labels`.
pub fn sample_value(exposition: &str, metric: &str, labels: &[&str]) -> Option<f64> {
    let found = samples(exposition, metric, labels);
    assert!(found.len() <= 1, "ambiguous samples: {found:?}");
    found.first().and_then(|line| value_of(line))
}

pub fn value_of(line: &str) -> Option<f64> {
    line.rsplit_once(' ').and_then(|(_, v)| v.parse().ok())
}

/// Extracts the value of `label` from a sample line.
pub fn label_value<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    let needle = format!("{label}=\"");
    let start = line.find(&needle)? + needle.len();
    let rest = &line[start..];
    rest.find('"').map(|end| &rest[..end])
}

/// Minimal check of the text exposition format: comments are HELP/TYPE lines,
/// every other line is `name[{labels}] value` with a numeric value.
pub fn assert_valid_exposition(exposition: &str) {
    for line in exposition.lines().filter(|l| !l.is_empty()) {
        if let Some(comment) = line.strip_prefix('#') {
            let comment = comment.trim_start();
            assert!(
                comment.starts_with("HELP ") || comment.starts_with("TYPE "),
                "unexpected comment line: {line}"
            );
            continue;
        }
        let name_end = line.find(['{', ' ']).expect("sample without value");
        let name = &line[..name_end];
        assert!(
            !name.is_empty()
                && name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':'),
            "invalid metric name in: {line}"
        );
        let value = line.rsplit_once(' ').map(|(_, v)| v).unwrap_or("");
        assert!(
            value.parse::<f64>().is_ok() || value == "+Inf" || value == "-Inf" || value == "NaN",
            "invalid sample value in: {line}"
        );
    }
}
