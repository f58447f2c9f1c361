//! Access-log and recovery middleware against an in-process router.

use std::io;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::get;
use axum::{Extension, Router};
use futures_util::future::join_all;
use tower::ServiceExt;

use service_log::http::middleware::{access_middleware_with, recovery_middleware_with};
use service_log::http::{ConnectionAborted, RequestErrors};
use service_log::HttpServer;

mod common;

#[tokio::test]
async fn successful_request_yields_one_access_record() {
    let dir = tempfile::tempdir().unwrap();
    let (registry, console) = common::capturing_registry("dev", dir.path());
    let app = HttpServer::build_router(&registry, true);

    let response = app.oneshot(common::get("/ping?ref=abc")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let lines = console.lines();
    assert_eq!(lines.len(), 1, "{lines:#?}");
    let line = &lines[0];
    assert!(line.contains(" INFO middleware/access.rs:"), "{line}");
    assert!(
        line.contains(
            " /ping status=200 method=GET path=/ping query=ref=abc ip=203.0.113.9 user-agent=probe/1.0 errors=\"\" cost="
        ),
        "{line}"
    );
    assert!(line.ends_with(" ref=abc"), "{line}");
}

#[tokio::test]
async fn missing_ref_is_logged_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let (registry, console) = common::capturing_registry("dev", dir.path());
    let app = HttpServer::build_router(&registry, true);

    app.oneshot(common::get("/ping")).await.unwrap();

    let lines = console.lines();
    assert_eq!(lines.len(), 1);
    assert_eq!(common::field(&lines[0], "query"), Some("\"\""));
    assert_eq!(common::field(&lines[0], "ref"), Some("\"\""));
}

#[tokio::test]
async fn generic_panic_is_logged_with_stack_and_answered_with_500() {
    let dir = tempfile::tempdir().unwrap();
    let (registry, console) = common::capturing_registry("dev", dir.path());
    let app = HttpServer::build_router(&registry, true);

    let response = app.oneshot(common::get("/divide?d=0")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.extensions().get::<ConnectionAborted>().is_none());
    let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
    assert!(body.is_empty());

    let lines = console.lines();
    assert_eq!(lines.len(), 2, "{lines:#?}");

    let fault = &lines[0];
    assert!(fault.contains(" ERROR middleware/recovery.rs:"), "{fault}");
    assert!(fault.contains(" [Recovery from panic] "), "{fault}");
    assert!(fault.contains("error=\"attempt to divide by zero\""), "{fault}");
    assert!(fault.contains("request=\"GET /divide?d=0 HTTP/1.1\\r\\n"), "{fault}");
    let stack = fault.split(" stack=\"").nth(1).expect("stack field");
    assert!(stack.trim_end_matches('"').len() > 10, "{fault}");

    let access = &lines[1];
    assert!(access.contains(" INFO "), "{access}");
    assert_eq!(common::field(access, "status"), Some("500"));
}

#[tokio::test]
async fn generic_panic_without_capture_has_no_stack() {
    let dir = tempfile::tempdir().unwrap();
    let (registry, console) = common::capturing_registry("dev", dir.path());
    let app = HttpServer::build_router(&registry, false);

    let response = app.oneshot(common::get("/divide")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let lines = console.lines();
    assert_eq!(lines.len(), 2, "{lines:#?}");
    assert!(lines[0].contains("[Recovery from panic]"));
    assert!(!lines[0].contains(" stack="), "{}", lines[0]);
}

#[tokio::test]
async fn broken_pipe_writes_no_status_and_attaches_the_error() {
    let dir = tempfile::tempdir().unwrap();
    let (registry, console) = common::capturing_registry("dev", dir.path());
    let app = HttpServer::build_router(&registry, true);

    let response = app.oneshot(common::get("/stream-closed")).await.unwrap();
    assert!(response.extensions().get::<ConnectionAborted>().is_some());
    assert_ne!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let lines = console.lines();
    assert_eq!(lines.len(), 2, "{lines:#?}");

    let fault = &lines[0];
    assert!(fault.contains(" ERROR "), "{fault}");
    assert!(fault.contains(" /stream-closed error="), "{fault}");
    assert!(fault.contains("broken pipe"), "{fault}");
    assert!(!fault.contains("[Recovery from panic]"));
    assert!(!fault.contains(" stack="));

    let access = &lines[1];
    assert!(
        access.contains("errors=\"Error #01: write tcp 127.0.0.1:8080: broken pipe\""),
        "{access}"
    );
}

#[tokio::test]
#[allow(dependency_on_unit_never_type_fallback)]
async fn connection_reset_is_a_dead_connection_too() {
    let dir = tempfile::tempdir().unwrap();
    let (registry, console) = common::capturing_registry("dev", dir.path());

    let app = Router::new()
        .route(
            "/reset",
            get(|| async {
                std::panic::panic_any(io::Error::other("read tcp: CONNECTION RESET BY PEER"));
            }),
        )
        .layer(recovery_middleware_with(registry.error_logger().clone(), true));

    let response = app
        .oneshot(Request::get("/reset").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert!(response.extensions().get::<ConnectionAborted>().is_some());

    let lines = console.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains(" /reset error="));
}

#[tokio::test]
async fn handler_errors_reach_the_access_record() {
    let dir = tempfile::tempdir().unwrap();
    let (registry, console) = common::capturing_registry("dev", dir.path());
    let app = HttpServer::build_router(&registry, true);

    let response = app.oneshot(common::get("/divide?d=zero")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let access = console.lines().pop().unwrap();
    assert!(access.contains("errors=\"Error #01: bad divisor:"), "{access}");
}

#[tokio::test]
async fn public_errors_are_left_out_of_the_summary() {
    let dir = tempfile::tempdir().unwrap();
    let (registry, console) = common::capturing_registry("dev", dir.path());

    let app = Router::new()
        .route(
            "/mixed",
            get(|Extension(errors): Extension<RequestErrors>| async move {
                errors.public("shown to client");
                errors.private("kept internal");
                "ok"
            }),
        )
        .layer(access_middleware_with(registry.logger().clone()));

    app.oneshot(common::get("/mixed")).await.unwrap();

    let access = console.lines().pop().unwrap();
    assert!(access.contains("errors=\"Error #01: kept internal\""), "{access}");
    assert!(!access.contains("shown to client"));
}

#[tokio::test]
#[allow(dependency_on_unit_never_type_fallback)]
async fn recorded_cost_covers_the_handler() {
    let dir = tempfile::tempdir().unwrap();
    let (registry, console) = common::capturing_registry("dev", dir.path());
    let pause = Duration::from_millis(40);

    let app = Router::new()
        .route(
            "/slow",
            get(move || async move {
                tokio::time::sleep(pause).await;
                panic!("gave up after sleeping");
            }),
        )
        .layer(recovery_middleware_with(registry.error_logger().clone(), false))
        .layer(access_middleware_with(registry.logger().clone()));

    let response = app.oneshot(common::get("/slow")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let access = console.lines().pop().unwrap();
    let cost = common::parse_debug_duration(common::field(&access, "cost").unwrap());
    assert!(cost >= pause, "cost {cost:?} shorter than handler pause {pause:?}");
    assert_eq!(common::field(&access, "status"), Some("500"));
}

#[tokio::test]
async fn one_record_per_concurrent_request() {
    let dir = tempfile::tempdir().unwrap();
    let (registry, console) = common::capturing_registry("dev", dir.path());
    let app = HttpServer::build_router(&registry, false);

    let requests = (0..16).map(|i| {
        let app = app.clone();
        async move {
            let uri = if i % 4 == 0 { "/divide?d=0".to_string() } else { format!("/ping?ref=r{i}") };
            app.oneshot(common::get(&uri)).await.unwrap().status()
        }
    });
    let statuses = join_all(requests).await;
    assert_eq!(statuses.iter().filter(|s| **s == StatusCode::OK).count(), 12);

    let lines = console.lines();
    let access = lines.iter().filter(|l| l.contains(" INFO ")).count();
    let faults = lines.iter().filter(|l| l.contains(" ERROR ")).count();
    assert_eq!(access, 16);
    assert_eq!(faults, 4);
}
