#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use kubehook_core::review::OutgoingEnvelope;
use kubehook_gateway::{app_state::AppState, config, router};

const PARENT: &str = "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01";

fn app() -> (AppState, Router) {
    let state = AppState::new(config::GatewayConfig::default()).expect("default state");
    let router = router::build_router(state.clone());
    (state, router)
}

fn review(body: &Value) -> Request<Body> {
    Request::post("/audit")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

async fn body_text(res: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn sar() -> Value {
    json!({
        "apiVersion": "authorization.k8s.io/v1",
        "kind": "SubjectAccessReview",
        "spec": { "user": "jane", "nonResourceAttributes": { "path": "/version", "verb": "get" } }
    })
}

#[tokio::test]
async fn review_returns_json_envelope() {
    let (_, router) = app();
    let res = router.oneshot(review(&sar())).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[header::CONTENT_TYPE], "application/json");
    assert!(res.headers().contains_key("traceparent"));

    let out: OutgoingEnvelope = serde_json::from_str(&body_text(res).await).unwrap();
    assert!(out.authorization_status().unwrap().allowed);
}

#[tokio::test]
async fn traceparent_continues_caller_trace() {
    let (_, router) = app();
    let mut req = review(&sar());
    req.headers_mut().insert("traceparent", PARENT.parse().unwrap());

    let res = router.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let tp = res.headers()["traceparent"].to_str().unwrap().to_owned();
    let parts: Vec<&str> = tp.split('-').collect();
    assert_eq!(parts.len(), 4);
    assert_eq!(parts[1], "4bf92f3577b34da6a3ce929d0e0e4736");
    assert_ne!(parts[2], "00f067aa0ba902b7");
    assert_eq!(parts[3], "01");
}

#[tokio::test]
async fn malformed_traceparent_is_not_fatal() {
    let (_, router) = app();
    let mut req = review(&sar());
    req.headers_mut().insert("traceparent", "garbage".parse().unwrap());

    let res = router.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let tp = res.headers()["traceparent"].to_str().unwrap().to_owned();
    assert!(!tp.contains("4bf92f3577b34da6a3ce929d0e0e4736"));
}

#[tokio::test]
async fn unknown_kind_is_a_500_with_text() {
    let (state, router) = app();
    let res = router
        .oneshot(review(&json!({ "apiVersion": "v1", "kind": "TokenReview" })))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(res.headers().contains_key("traceparent"));
    let text = body_text(res).await;
    assert!(text.contains("TokenReview"), "{text}");
    assert_eq!(state.metrics().dispatch_errors.get(&[("code", "UNKNOWN_KIND")]), 1);
}

#[tokio::test]
async fn malformed_admission_object_is_a_500() {
    let (state, router) = app();
    let body = json!({
        "apiVersion": "admission.k8s.io/v1",
        "kind": "AdmissionReview",
        "request": {
            "uid": "u-9",
            "kind": { "group": "", "version": "v1", "kind": "Pod" },
            "resource": { "group": "", "version": "v1", "resource": "pods" },
            "operation": "CREATE",
            "userInfo": { "username": "alice" },
            "dryRun": false,
            "object": { "metadata": { "name": "web-0" }, "spec": { "containers": "nope" } }
        }
    });
    let res = router.oneshot(review(&body)).await.unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_text(res).await.contains("unmarshal"));
    assert_eq!(state.metrics().admission_denied.get(&[]), 1);
}

#[tokio::test]
async fn array_body_is_a_500() {
    let (state, router) = app();
    let res = router
        .oneshot(review(&json!(["audit.k8s.io/v1", "EventList"])))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(state.metrics().event_lists_processed.get(&[]), 0);
    assert_eq!(state.metrics().dispatch_errors.get(&[("code", "DECODE_ERROR")]), 1);
}

#[tokio::test]
async fn null_event_list_is_acknowledged() {
    let (state, router) = app();
    let res = router
        .oneshot(review(&json!({
            "apiVersion": "audit.k8s.io/v1",
            "kind": "EventList",
            "metadata": null,
            "items": null
        })))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let out: OutgoingEnvelope = serde_json::from_str(&body_text(res).await).unwrap();
    assert!(out.audit_ack().is_some());
    assert_eq!(state.metrics().event_lists_processed.get(&[]), 1);
    assert_eq!(state.metrics().events_processed.get(&[]), 0);
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let cfg = config::load_from_str("version: 1\ngateway:\n  max_body_bytes: 1024\n").unwrap();
    let state = AppState::new(cfg).unwrap();
    let router = router::build_router(state.clone());

    let padding = "x".repeat(4096);
    let res = router
        .oneshot(review(&json!({ "kind": "EventList", "items": [ { "pad": padding } ] })))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(state.metrics().incoming_requests.get(&[]), 0);
}

#[tokio::test]
async fn get_on_review_path_is_not_allowed() {
    let (_, router) = app();
    let res = router
        .oneshot(Request::get("/audit").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn metrics_endpoint_reports_counters_and_latency() {
    let (_, router) = app();
    let res = router.clone().oneshot(review(&sar())).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = router
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/plain"));

    let text = body_text(res).await;
    assert!(text.contains("kubehook_incoming_requests_total 1"), "{text}");
    assert!(text.contains("kubehook_authorizer_processed_requests_allowed_total 1"), "{text}");
    assert!(text.contains(r#"kubehook_review_requests_total{kind="SubjectAccessReview"} 1"#), "{text}");
    assert!(text.contains(r#"kubehook_http_duration_micros_count{path="/audit"} 1"#), "{text}");
}

#[tokio::test]
async fn readyz_flips_when_draining() {
    let (state, router) = app();

    let res = router
        .clone()
        .oneshot(Request::get("/readyz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    state.metrics().set_draining();
    let res = router
        .clone()
        .oneshot(Request::get("/readyz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

    let res = router
        .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}
