//! In-process tests of the HTTP layer driving a custom route table.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use live_forum::broadcast::Fanout;
use live_forum::config::AppConfig;
use live_forum::http::{HandlerResult, HttpServer};
use live_forum::routing::{Dispatcher, MutationNotifier, RouteTable};

#[derive(Default)]
struct Widgets {
    created: Vec<String>,
}

fn app() -> (Router, Arc<AtomicUsize>) {
    let mut routes: RouteTable<Widgets> = RouteTable::new();
    routes
        .get(r"^/api/widgets/(\d+)$", |_, ctx| {
            HandlerResult::json(&json!({ "id": ctx.param(0) }))
        })
        .unwrap()
        .post(
            r"^/api/widgets/?$",
            &[("name", "Widget name."), ("size", "Widget size.")],
            |widgets, ctx| {
                let name = ctx.request.json_text("name").unwrap_or_default();
                widgets.created.push(name.clone());
                HandlerResult::with_status(StatusCode::CREATED, &json!({ "name": name }))
            },
        )
        .unwrap();

    let notified = Arc::new(AtomicUsize::new(0));
    let counter = notified.clone();
    let notifier: Arc<dyn MutationNotifier> = Arc::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let dispatcher = Dispatcher::new(routes, Arc::new(Mutex::new(Widgets::default())), notifier);
    let config = AppConfig::default();
    let server = HttpServer::new(&config, Arc::new(dispatcher), Arc::new(Fanout::new()));
    (server.router(), notified)
}

async fn call(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_capture_is_passed_to_handler() {
    let (router, notified) = app();
    let request = Request::get("/api/widgets/42").body(Body::empty()).unwrap();

    let (status, body) = call(router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"id": "42"}));
    assert_eq!(notified.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_non_matching_capture_is_404() {
    let (router, notified) = app();
    let request = Request::get("/api/widgets/abc").body(Body::empty()).unwrap();

    let (status, body) = call(router, request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "No matching route"}));
    assert_eq!(notified.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_required_fields_checked_before_handler() {
    let (router, notified) = app();
    let request = Request::post("/api/widgets")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"name": "bolt"}"#))
        .unwrap();

    let (status, body) = call(router.clone(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("size"));
    assert_eq!(notified.load(Ordering::SeqCst), 0);

    let request = Request::post("/api/widgets")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"name": "bolt", "size": 3}"#))
        .unwrap();
    let (status, body) = call(router, request).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({"name": "bolt"}));
    assert_eq!(notified.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let mut config = AppConfig::default();
    config.security.max_body_size = 16;
    let routes: RouteTable<Widgets> = RouteTable::new();
    let notifier: Arc<dyn MutationNotifier> = Arc::new(|| {});
    let dispatcher = Dispatcher::new(routes, Arc::new(Mutex::new(Widgets::default())), notifier);
    let router = HttpServer::new(&config, Arc::new(dispatcher), Arc::new(Fanout::new())).router();

    let request = Request::post("/api/widgets")
        .body(Body::from("x".repeat(64)))
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}
