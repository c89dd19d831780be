//! Interceptor chains: router-wide, inline and built-in.

use axum::http::StatusCode;
use waymark::http::middleware::{recover, request_id};
use waymark::http::{from_fn, Interceptor, Next, Request, RequestExt, X_REQUEST_ID};
use waymark::{Routable, RouterError};

mod common;
use common::{request, router, send, send_request, text};

fn tag(name: &'static str) -> Interceptor {
    from_fn(move |req: Request, next: Next| async move {
        let mut res = next.run(req).await;
        res.headers_mut().append("x-tag", name.parse().unwrap());
        res
    })
}

fn tags(reply: &common::Reply) -> Vec<String> {
    reply
        .headers
        .get_all("x-tag")
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_first_interceptor_is_outermost() {
    let mut r = router();
    r.use_interceptor(tag("outer")).unwrap();
    r.use_interceptor(tag("inner")).unwrap();
    r.get("/", text("ok")).unwrap();
    let svc = r.into_service();

    let res = send(&svc, "GET", "/").await;
    assert_eq!(tags(&res), ["inner", "outer"]);
}

#[tokio::test]
async fn test_router_interceptors_wrap_fallbacks() {
    let mut r = router();
    r.use_interceptor(tag("root")).unwrap();
    r.get("/", text("ok")).unwrap();
    let svc = r.into_service();

    let res = send(&svc, "GET", "/missing").await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(tags(&res), ["root"]);

    let res = send(&svc, "POST", "/").await;
    assert_eq!(res.status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(tags(&res), ["root"]);
}

#[tokio::test]
async fn test_inline_interceptors_apply_to_their_routes_only() {
    let mut r = router();
    r.use_interceptor(tag("root")).unwrap();
    r.get("/open", text("open")).unwrap();
    r.with(tag("inline")).get("/guarded", text("guarded")).unwrap();
    let svc = r.into_service();

    assert_eq!(tags(&send(&svc, "GET", "/open").await), ["root"]);
    assert_eq!(tags(&send(&svc, "GET", "/guarded").await), ["inline", "root"]);
}

#[tokio::test]
async fn test_group_interceptors() {
    let mut r = router();
    r.group(|g| {
        g.use_interceptor(tag("group"))?;
        g.get("/a", text("a"))?;
        g.with(tag("nested")).get("/b", text("b"))
    })
    .unwrap();
    r.get("/c", text("c")).unwrap();
    let svc = r.into_service();

    assert_eq!(tags(&send(&svc, "GET", "/a").await), ["group"]);
    assert_eq!(tags(&send(&svc, "GET", "/b").await), ["nested", "group"]);
    assert!(tags(&send(&svc, "GET", "/c").await).is_empty());
}

#[test]
fn test_interceptors_frozen_after_routes() {
    let mut r = router();
    r.get("/", text("ok")).unwrap();
    let err = r.use_interceptor(tag("late")).unwrap_err();
    assert!(matches!(err, RouterError::InterceptorsFrozen));

    let mut r = router();
    let mut inline = r.with(tag("a"));
    inline.get("/", text("ok")).unwrap();
    let err = inline.use_interceptor(tag("late")).unwrap_err();
    assert!(matches!(err, RouterError::InterceptorsFrozen));
}

#[tokio::test]
async fn test_interceptor_can_short_circuit() {
    let auth = from_fn(|req: Request, next: Next| async move {
        if req.headers().contains_key("authorization") {
            next.run(req).await
        } else {
            axum::response::IntoResponse::into_response(StatusCode::UNAUTHORIZED)
        }
    });

    let mut r = router();
    r.with(auth).get("/secret", text("secret")).unwrap();
    let svc = r.into_service();

    assert_eq!(send(&svc, "GET", "/secret").await.status, StatusCode::UNAUTHORIZED);

    let mut req = request("GET", "/secret");
    req.headers_mut()
        .insert("authorization", "Bearer t".parse().unwrap());
    assert_eq!(send_request(&svc, req).await.body, "secret");
}

#[tokio::test]
async fn test_router_interceptor_sees_pattern_after_dispatch() {
    let capture = from_fn(|req: Request, next: Next| async move {
        let ctx = req.route_context();
        let mut res = next.run(req).await;
        if let Some(handle) = ctx {
            let pattern = handle.route_pattern();
            res.headers_mut()
                .insert("x-pattern", pattern.parse().unwrap());
        }
        res
    });

    let mut r = router();
    r.use_interceptor(capture).unwrap();
    r.get("/users/{id}", text("user")).unwrap();
    let svc = r.into_service();

    let res = send(&svc, "GET", "/users/9").await;
    assert_eq!(res.header("x-pattern"), Some("/users/{id}"));
}

#[tokio::test]
async fn test_request_id_interceptor() {
    let mut r = router();
    r.use_interceptor(request_id()).unwrap();
    r.get("/", |req: Request| async move {
        req.request_id().map(|id| id.to_string()).unwrap_or_default()
    })
    .unwrap();
    let svc = r.into_service();

    let res = send(&svc, "GET", "/").await;
    let id = res.header(X_REQUEST_ID).unwrap().to_string();
    assert_eq!(res.body, id);

    let mut req = request("GET", "/");
    req.headers_mut()
        .insert(X_REQUEST_ID, "upstream-1".parse().unwrap());
    let res = send_request(&svc, req).await;
    assert_eq!(res.header(X_REQUEST_ID), Some("upstream-1"));
}

#[tokio::test]
async fn test_recover_turns_panic_into_500() {
    let mut r = router();
    r.use_interceptor(recover()).unwrap();
    r.get("/boom", |_req: Request| async {
        if true {
            panic!("boom");
        }
        "unreachable"
    })
    .unwrap();
    let svc = r.into_service();

    let res = send(&svc, "GET", "/boom").await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);

    // The context lease survives the unwind.
    assert_eq!(svc.idle_contexts(), 1);
}
