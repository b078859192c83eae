//! Core request/response cycles, dispatched directly and through the
//! axum adapter.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use hook_router::response::{CONTENT_TYPE_JSON, CONTENT_TYPE_TEXT};
use hook_router::{
    App, DispatchRequest, HttpServer, Json, RequestContext, RouteOptions, Scope, ServerConfig,
};
use serde_json::json;
use tower::ServiceExt;

mod common;

fn basic_app() -> App {
    let mut app = App::new();
    app.get("/", |_ctx| async { "hi" })
        .unwrap()
        .static_route(Method::GET, "/static", "hi")
        .unwrap()
        .post("/json", |ctx: RequestContext| async move { ctx.body().cloned() })
        .unwrap();
    app
}

#[tokio::test]
async fn test_handle_request() {
    let app = common::compile(&basic_app());

    let res = app.handle(DispatchRequest::get("/")).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.text(), "hi");
    assert_eq!(res.content_type(), Some(CONTENT_TYPE_TEXT));
}

#[tokio::test]
async fn test_handle_static_response() {
    let app = common::compile(&basic_app());

    let res = app.handle(DispatchRequest::get("/static")).await;
    assert_eq!(res.text(), "hi");
    assert_eq!(res.content_type(), Some(CONTENT_TYPE_TEXT));
}

#[tokio::test]
async fn test_handle_body() {
    let app = common::compile(&basic_app());

    let res = app
        .handle(common::json_request(Method::POST, "/json", r#"{"a":1}"#))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.text(), r#"{"a":1}"#);
    assert_eq!(res.content_type(), Some(CONTENT_TYPE_JSON));
}

#[tokio::test]
async fn test_malformed_json_body_is_bad_request() {
    let app = common::compile(&basic_app());

    let res = app
        .handle(common::json_request(Method::POST, "/json", "{oops"))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_handle_plugin() {
    let mut plugin = App::with_prefix("/api/v1");
    plugin
        .route_with(
            Method::POST,
            "/",
            |_ctx| async { Json(json!({ "message": "Yugiri" })) },
            RouteOptions::new().before_handle(|ctx: RequestContext| async move {
                let _ = ctx.headers();
            }),
        )
        .unwrap();

    let mut app = App::new();
    app.mount(&plugin).unwrap();
    let app = common::compile(&app);

    let res = app
        .handle(common::json_request(
            Method::POST,
            "/api/v1",
            r#"{"message":"Hello Yugiri"}"#,
        ))
        .await;
    assert_eq!(res.text(), r#"{"message":"Yugiri"}"#);
    assert_eq!(res.content_type(), Some(CONTENT_TYPE_JSON));

    // Only reachable under the prefix.
    let res = app.handle(common::json_request(Method::POST, "/", "{}")).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_handle_cookie() {
    let mut app = App::new();
    app.apply(|app| {
        app.derive(Scope::Global, |ctx: RequestContext| async move {
            let _ = ctx.cookie("session");
            Ok(hook_router::Derived::new())
        })
        .on_after_handle(Scope::Global, |ctx: RequestContext| async move {
            ctx.response().cloned()
        });
        Ok(())
    })
    .unwrap()
    .get("/", |_ctx| async { "ok" })
    .unwrap();
    let app = common::compile(&app);

    let res = app.handle(DispatchRequest::get("/")).await;
    assert_eq!(res.text(), "ok");
    assert_eq!(res.content_type(), Some(CONTENT_TYPE_TEXT));
}

#[tokio::test]
async fn test_through_axum_adapter() {
    let server = HttpServer::new(ServerConfig::default(), common::compile(&basic_app()));

    let res = server
        .router()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/json?debug=1")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"a":1}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers().get(header::CONTENT_TYPE).unwrap(),
        CONTENT_TYPE_JSON
    );
    assert!(res.headers().contains_key("x-request-id"));

    let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], br#"{"a":1}"#);
}

#[tokio::test]
async fn test_adapter_rejects_oversized_body() {
    let mut config = ServerConfig::default();
    config.limits.max_body_size = 8;
    let server = HttpServer::new(config, common::compile(&basic_app()));

    let res = server
        .router()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/json")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"a":"this is far too long"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_adapter_not_found() {
    let server = HttpServer::new(ServerConfig::default(), common::compile(&basic_app()));

    let res = server
        .router()
        .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
