//! Route introspection: `walk` and `Routes::find`.

use std::convert::Infallible;

use waymark::http::middleware::recover;
use waymark::methods::STANDARD_METHODS;
use waymark::{walk, Routable, RouteContext, Router, Routes};

mod common;
use common::{router, text};

fn listing(routes: &dyn Routes) -> Vec<(String, String, usize)> {
    let mut out = Vec::new();
    walk(routes, |method, path, _handler, interceptors| {
        out.push((method.to_string(), path.to_string(), interceptors.len()));
        Ok::<_, Infallible>(())
    })
    .unwrap();
    out
}

fn demo() -> Router {
    let mut r = router();
    r.use_interceptor(recover()).unwrap();
    r.get("/", text("root")).unwrap();
    r.handle("/all", text("all")).unwrap();
    r.with(recover()).post("/guarded", text("guarded")).unwrap();
    r.route("/api", |api| {
        api.get("/users/{id}", text("user"))?;
        api.delete("/users/{id}", text("gone"))
    })
    .unwrap();
    r
}

#[test]
fn test_walk_lists_every_method_and_full_path() {
    let routes = listing(&demo().into_service());
    let has = |m: &str, p: &str| routes.iter().any(|(method, path, _)| method == m && path == p);

    assert!(has("GET", "/"));
    assert!(has("POST", "/guarded"));
    assert!(has("GET", "/api/users/{id}"));
    assert!(has("DELETE", "/api/users/{id}"));
    for method in STANDARD_METHODS {
        assert!(has(method, "/all"), "{method} /all missing");
    }
}

#[test]
fn test_walk_hides_mount_stubs() {
    let routes = listing(&demo().into_service());
    assert!(routes.iter().all(|(_, path, _)| !path.starts_with("/api") || path.ends_with("{id}")));
}

#[test]
fn test_walk_counts_interceptors() {
    let routes = listing(&demo().into_service());
    let count = |m: &str, p: &str| {
        routes
            .iter()
            .find(|(method, path, _)| method == m && path == p)
            .map(|(_, _, n)| *n)
    };

    assert_eq!(count("GET", "/"), Some(1));
    assert_eq!(count("POST", "/guarded"), Some(2));
    assert_eq!(count("GET", "/api/users/{id}"), Some(1));
}

#[test]
fn test_walk_works_before_freeze() {
    let r = demo();
    let before = listing(&r);
    let after = listing(&r.into_service());
    assert_eq!(before, after);
}

#[test]
fn test_walk_includes_custom_methods() {
    let mut r = router();
    r.registry().register("LINK").unwrap();
    r.handle("/any", text("any")).unwrap();
    r.method("LINK", "/link", text("link")).unwrap();

    let routes = listing(&r.into_service());
    assert!(routes.contains(&("LINK".to_string(), "/any".to_string(), 0)));
    assert!(routes.contains(&("LINK".to_string(), "/link".to_string(), 0)));
}

#[test]
fn test_walk_stops_on_visitor_error() {
    let svc = demo().into_service();
    let mut seen = 0;
    let result = walk(&svc, |_, _, _, _| {
        seen += 1;
        Err("stop")
    });
    assert_eq!(result, Err("stop"));
    assert_eq!(seen, 1);
}

#[test]
fn test_find_descends_into_mounts() {
    let svc = demo().into_service();

    let mut ctx = RouteContext::new();
    assert!(svc.find(&mut ctx, "GET", "/api/users/7"));
    assert_eq!(ctx.route_pattern(), "/api/users/{id}");

    let mut ctx = RouteContext::new();
    assert!(!svc.find(&mut ctx, "PUT", "/api/users/7"));
    assert!(ctx.method_not_allowed());

    let mut ctx = RouteContext::new();
    assert!(!svc.find(&mut ctx, "GET", "/nowhere"));
    assert!(!svc.find(&mut RouteContext::new(), "BREW", "/"));
}

#[test]
fn test_walk_keeps_routes_sharing_a_mount_prefix() {
    let mut sub = router();
    sub.get("/x", text("x")).unwrap();

    let mut r = router();
    r.post("/api", text("create")).unwrap();
    r.mount("/api", sub).unwrap();

    let routes = listing(&r.into_service());
    assert!(routes.contains(&("POST".to_string(), "/api".to_string(), 0)));
    assert!(routes.contains(&("GET".to_string(), "/api/x".to_string(), 0)));
    // The stub's any-method slot is not expanded onto the prefix.
    assert!(!routes.contains(&("GET".to_string(), "/api".to_string(), 0)));
}
