mod common;

use axum::http::StatusCode;
use common::{
    assert_valid_exposition, build_test_app, get, label_value, load_test_config, sample_value,
    samples, scrape, TEST_CONFIG,
};
use futures::future::join_all;
use tower::ServiceExt;
use webmetric::metrics::{
    DEFAULT_MAX_ENDPOINT_SERIES, OVERFLOW_LABEL, REQUEST_COUNT_INSTRUMENT, REQUEST_DURATION_BUCKETS,
};

const COUNTER: &str = "myapp_custom_request_count_total";
const DURATION_BUCKET: &str = "http_server_request_duration_seconds_bucket";
const DURATION_COUNT: &str = "http_server_request_duration_seconds_count";

#[tokio::test]
async fn scrape_is_valid_exposition_with_custom_counter() {
    let (app, _metrics) = build_test_app(load_test_config(TEST_CONFIG));

    let response = app
        .clone()
        .oneshot(get("/metrics"))
        .await
        .expect("scrape should complete");
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("Content-Type")
        .expect("Content-Type header missing")
        .to_str()
        .expect("Content-Type not valid UTF-8")
        .to_string();
    assert!(content_type.starts_with("text/plain; version=0.0.4"));

    let body = common::body_string(response).await;
    assert_valid_exposition(&body);
    assert!(body.contains(REQUEST_COUNT_INSTRUMENT));
    assert_eq!(
        sample_value(&body, COUNTER, &["endpoint=\"/metrics\""]),
        Some(1.0)
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_are_all_counted() {
    const REQUESTS: usize = 200;
    let (app, _metrics) = build_test_app(load_test_config(TEST_CONFIG));

    let handles = (0..REQUESTS).map(|_| {
        let app = app.clone();
        tokio::spawn(async move { app.oneshot(get("/")).await })
    });
    for result in join_all(handles).await {
        let response = result
            .expect("task should not panic")
            .expect("request should succeed");
        assert_eq!(response.status(), StatusCode::OK);
    }

    let body = scrape(&app, "/metrics").await;
    assert_eq!(
        sample_value(&body, COUNTER, &["endpoint=\"/\""]),
        Some(REQUESTS as f64)
    );
    assert_eq!(
        sample_value(&body, DURATION_COUNT, &["http_route=\"/\""]),
        Some(REQUESTS as f64)
    );
}

#[tokio::test]
async fn duration_histogram_reports_configured_buckets() {
    let (app, _metrics) = build_test_app(load_test_config(TEST_CONFIG));

    app.clone()
        .oneshot(get("/?utm_medium=social"))
        .await
        .expect("request should succeed");

    let body = scrape(&app, "/metrics").await;
    let bounds: Vec<f64> = samples(&body, DURATION_BUCKET, &["mkt_medium=\"social\""])
        .into_iter()
        .filter_map(|line| label_value(line, "le"))
        .filter(|le| *le != "+Inf")
        .map(|le| le.parse().expect("bucket bound should be numeric"))
        .collect();

    assert_eq!(bounds, REQUEST_DURATION_BUCKETS.to_vec());
}

#[tokio::test]
async fn utm_medium_becomes_mkt_medium_label() {
    let (app, _metrics) = build_test_app(load_test_config(TEST_CONFIG));

    let cases = [
        ("/", "none"),
        ("/?utm_medium=social", "social"),
        ("/?utm_medium=email", "email"),
        ("/?utm_medium=organic", "organic"),
        ("/?utm_medium=xyz", "other"),
        ("/?utm_medium=tv", "other"),
    ];
    for (uri, _) in cases {
        app.clone()
            .oneshot(get(uri))
            .await
            .expect("request should succeed");
    }

    let body = scrape(&app, "/metrics").await;
    for (medium, expected) in [
        ("none", 1.0),
        ("social", 1.0),
        ("email", 1.0),
        ("organic", 1.0),
        ("other", 2.0),
    ] {
        let label = format!("mkt_medium=\"{medium}\"");
        assert_eq!(
            sample_value(&body, DURATION_COUNT, &["http_route=\"/\"", label.as_str()]),
            Some(expected),
            "medium {medium}"
        );
    }
    // the custom counter is keyed by path only
    assert_eq!(
        sample_value(&body, COUNTER, &["endpoint=\"/\""]),
        Some(cases.len() as f64)
    );
}

#[tokio::test]
async fn disabled_tagging_omits_medium_but_still_counts() {
    let config = load_test_config(
        r#"
version: "1.0.0"
metrics:
  request_tags: false
"#,
    );
    let (app, _metrics) = build_test_app(config);

    let response = app
        .clone()
        .oneshot(get("/?utm_medium=social"))
        .await
        .expect("request should succeed");
    assert_eq!(response.status(), StatusCode::OK);

    let body = scrape(&app, "/metrics").await;
    assert_eq!(sample_value(&body, COUNTER, &["endpoint=\"/\""]), Some(1.0));
    assert_eq!(
        sample_value(&body, DURATION_COUNT, &["http_route=\"/\"", "mkt_medium=\"\""]),
        Some(1.0)
    );
    assert!(!body.contains("mkt_medium=\"social\""));
}

#[tokio::test]
async fn scrape_path_follows_configuration() {
    let config = load_test_config(
        r#"
version: "1.0.0"
metrics:
  path: /internal/metrics
"#,
    );
    let (app, _metrics) = build_test_app(config);

    let body = scrape(&app, "/internal/metrics").await;
    assert!(body.contains(REQUEST_COUNT_INSTRUMENT));

    let response = app
        .clone()
        .oneshot(get("/metrics"))
        .await
        .expect("request should complete");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_paths_beyond_the_series_limit_fold_into_overflow() {
    const EXTRA: usize = 100;
    let (app, _metrics) = build_test_app(load_test_config(TEST_CONFIG));

    for i in 0..DEFAULT_MAX_ENDPOINT_SERIES + EXTRA {
        let response = app
            .clone()
            .oneshot(get(&format!("/scan/{i}")))
            .await
            .expect("request should complete");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
    // admitted before the limit was reached, so it keeps its own series
    app.clone()
        .oneshot(get("/scan/5"))
        .await
        .expect("request should complete");

    let body = scrape(&app, "/metrics").await;
    let overflow = format!("{OVERFLOW_LABEL}=\"true\"");
    let endpoint_series = samples(&body, COUNTER, &[])
        .into_iter()
        .filter(|line| label_value(line, OVERFLOW_LABEL) != Some("true"))
        .count();

    assert_eq!(endpoint_series, DEFAULT_MAX_ENDPOINT_SERIES);
    // the scrape itself arrives after the limit and overflows too
    assert_eq!(
        sample_value(&body, COUNTER, &[overflow.as_str()]),
        Some((EXTRA + 1) as f64)
    );
    assert_eq!(
        sample_value(&body, COUNTER, &["endpoint=\"/scan/5\""]),
        Some(2.0)
    );
    assert_eq!(
        sample_value(&body, COUNTER, &["endpoint=\"/scan/2000\""]),
        None
    );
    assert_valid_exposition(&body);
}

#[tokio::test]
async fn series_limit_follows_configuration() {
    let config = load_test_config(
        r#"
version: "1.0.0"
metrics:
  max_endpoint_series: 2
"#,
    );
    let (app, _metrics) = build_test_app(config);

    for uri in ["/", "/health", "/a", "/b", "/"] {
        app.clone()
            .oneshot(get(uri))
            .await
            .expect("request should complete");
    }

    let body = scrape(&app, "/metrics").await;
    let overflow = format!("{OVERFLOW_LABEL}=\"true\"");
    assert_eq!(sample_value(&body, COUNTER, &["endpoint=\"/\""]), Some(2.0));
    assert_eq!(
        sample_value(&body, COUNTER, &["endpoint=\"/health\""]),
        Some(1.0)
    );
    assert_eq!(
        sample_value(&body, COUNTER, &[overflow.as_str()]),
        Some(3.0)
    );
}
