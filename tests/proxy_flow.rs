//! End-to-end request/response tests against a mock upstream.

use axum::body::Body;
use axum::http::{Method, Response, StatusCode};
use path_proxy::{ProxyConfig, ProxyError};

mod common;

use common::{client, start_proxy, upstream_response, MockForwarder};

const PAGE: &str = r#"<html><head>
<link rel="stylesheet" href="/static/site.css">
<style>.hero { background: url('/img/hero.jpg') }</style>
<script src="//cdn.other.com/lib.js"></script>
</head><body>
<a href="https://example.com/about">About</a>
<a href="https://other.org/">Elsewhere</a>
<img src="/logo.png" data-src="/lazy.png">
<form action="/search"></form>
</body></html>"#;

const REWRITTEN: &str = r#"<html><head>
<link rel="stylesheet" href="/example.com/static/site.css">
<style>.hero { background: url("/example.com/img/hero.jpg") }</style>
<script src="//cdn.other.com/lib.js"></script>
</head><body>
<a href="/example.com/about">About</a>
<a href="https://other.org/">Elsewhere</a>
<img src="/example.com/logo.png" data-src="/example.com/lazy.png">
<form action="/example.com/search"></form>
</body></html>"#;

#[tokio::test]
async fn test_html_response_rewritten() {
    let (forwarder, seen) =
        MockForwarder::new(|_| Ok(upstream_response("text/html; charset=utf-8", PAGE)));
    let (addr, shutdown) = start_proxy(ProxyConfig::default(), forwarder).await;

    let res = client()
        .get(format!("http://{}/example.com/about/team?lang=en", addr))
        .send()
        .await
        .expect("Proxy unreachable");

    assert_eq!(res.status(), 200);
    let content_length = res.headers()["content-length"].to_str().unwrap().to_string();
    let body = res.text().await.unwrap();
    assert_eq!(body, REWRITTEN);
    assert_eq!(content_length, body.len().to_string());

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].uri.to_string(), "https://example.com/about/team?lang=en");
    assert_eq!(seen[0].host.as_deref(), Some("example.com"));

    shutdown.trigger();
}

#[tokio::test]
async fn test_non_html_passes_through() {
    let payload: &'static [u8] = b"\x89PNG src=\"/logo.png\" https://example.com/x";
    let (forwarder, _) = MockForwarder::new(move |_| Ok(upstream_response("image/png", payload)));
    let (addr, shutdown) = start_proxy(ProxyConfig::default(), forwarder).await;

    let res = client()
        .get(format!("http://{}/example.com/logo.png", addr))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["content-type"], "image/png");
    assert_eq!(&res.bytes().await.unwrap()[..], payload);

    shutdown.trigger();
}

#[tokio::test]
async fn test_compressed_html_passes_through() {
    let (forwarder, _) = MockForwarder::new(|_| {
        Ok(Response::builder()
            .header("content-type", "text/html")
            .header("content-encoding", "br")
            .body(Body::from(r#"<img src="/logo.png">"#))
            .unwrap())
    });
    let (addr, shutdown) = start_proxy(ProxyConfig::default(), forwarder).await;

    let res = client()
        .get(format!("http://{}/example.com/", addr))
        .send()
        .await
        .unwrap();

    assert_eq!(res.headers()["content-encoding"], "br");
    assert_eq!(res.text().await.unwrap(), r#"<img src="/logo.png">"#);

    shutdown.trigger();
}

#[tokio::test]
async fn test_missing_domain_is_bad_request() {
    let (forwarder, seen) = MockForwarder::new(|_| Ok(upstream_response("text/plain", "unreachable")));
    let (addr, shutdown) = start_proxy(ProxyConfig::default(), forwarder).await;

    let res = client().get(format!("http://{}/", addr)).send().await.unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST.as_u16());
    assert!(res.headers()["content-type"].to_str().unwrap().starts_with("text/plain"));
    assert_eq!(res.text().await.unwrap(), "Invalid path");
    assert!(seen.lock().unwrap().is_empty(), "No upstream call for an invalid path");

    shutdown.trigger();
}

#[tokio::test]
async fn test_upstream_failure_is_bad_gateway() {
    let (forwarder, seen) =
        MockForwarder::new(|_| Err(ProxyError::Upstream("connection refused".into())));
    let (addr, shutdown) = start_proxy(ProxyConfig::default(), forwarder).await;

    let res = client()
        .get(format!("http://{}/down.example/", addr))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY.as_u16());
    assert_eq!(seen.lock().unwrap().len(), 1, "Exactly one upstream attempt");

    shutdown.trigger();
}

#[tokio::test]
async fn test_method_and_body_forwarded() {
    let (forwarder, seen) = MockForwarder::new(|request| {
        let content_type = request.headers()["content-type"].clone();
        let mut response = Response::new(request.into_body());
        response.headers_mut().insert("content-type", content_type);
        Ok(response)
    });
    let (addr, shutdown) = start_proxy(ProxyConfig::default(), forwarder).await;

    let res = client()
        .post(format!("http://{}/api.example/v1/items", addr))
        .header("content-type", "application/json")
        .body(r#"{"href":"/x"}"#)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), r#"{"href":"/x"}"#);

    let seen = seen.lock().unwrap();
    assert_eq!(seen[0].method, Method::POST);
    assert_eq!(seen[0].uri.path(), "/v1/items");

    shutdown.trigger();
}

#[tokio::test]
async fn test_request_id_propagated() {
    let (forwarder, seen) = MockForwarder::new(|_| Ok(upstream_response("text/plain", "ok")));
    let (addr, shutdown) = start_proxy(ProxyConfig::default(), forwarder).await;

    let res = client()
        .get(format!("http://{}/example.com/", addr))
        .header("x-request-id", "trace-42")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "trace-42");

    let res = client()
        .get(format!("http://{}/example.com/", addr))
        .send()
        .await
        .unwrap();
    let generated = res.headers()["x-request-id"].to_str().unwrap().to_string();
    assert!(!generated.is_empty());

    let seen = seen.lock().unwrap();
    assert_eq!(seen[0].request_id.as_deref(), Some("trace-42"));
    assert_eq!(seen[1].request_id.as_deref(), Some(generated.as_str()));

    shutdown.trigger();
}

#[tokio::test]
async fn test_rewrite_disabled() {
    let mut config = ProxyConfig::default();
    config.rewrite.enabled = false;

    let (forwarder, _) = MockForwarder::new(|_| Ok(upstream_response("text/html", PAGE)));
    let (addr, shutdown) = start_proxy(config, forwarder).await;

    let res = client()
        .get(format!("http://{}/example.com/", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.text().await.unwrap(), PAGE);

    shutdown.trigger();
}
