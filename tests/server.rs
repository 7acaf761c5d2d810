//! End-to-end tests of guarded modules behind the Axum router.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use tower::ServiceExt;

use route_guard::config::validation::ValidationError;
use route_guard::config::{parse_config, ConfigError, GuardConfig};
use route_guard::security::{Module, ModuleSecurity};
use route_guard::GuardServer;

const CONFIG: &str = r#"
[forwarding]
trust_forwarded_proto = true

[[modules]]
name = "public"
path_prefix = "/public"

[[modules]]
name = "account"
path_prefix = "/account"
require_authentication = true

[[modules]]
name = "admin"
path_prefix = "/admin"
required_claims = ["admin"]

[[modules]]
name = "billing"
path_prefix = "/billing"
https = { redirect = true }

[[modules]]
name = "payments"
path_prefix = "/payments"
https = { redirect = false }
"#;

fn config() -> GuardConfig {
    parse_config(CONFIG).expect("test config should be valid")
}

fn router() -> Router {
    GuardServer::new(config()).router()
}

fn get(path: &str) -> axum::http::request::Builder {
    Request::builder()
        .method("GET")
        .uri(path)
        .header("host", "localhost")
}

async fn send(router: Router, req: Request<Body>) -> axum::response::Response {
    router.oneshot(req).await.expect("router is infallible")
}

#[tokio::test]
async fn test_public_module_passes() {
    let res = send(router(), get("/public/page").body(Body::empty()).unwrap()).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_authentication_required() {
    let res = send(router(), get("/account").body(Body::empty()).unwrap()).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = send(
        router(),
        get("/account/settings")
            .header("x-forwarded-user", "bob")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_claims_required() {
    let res = send(
        router(),
        get("/admin/users")
            .header("x-forwarded-user", "bob")
            .header("x-forwarded-claims", "viewer")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = send(
        router(),
        get("/admin/users")
            .header("x-forwarded-user", "bob")
            .header("x-forwarded-claims", "viewer, admin")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_https_redirect_keeps_original_path() {
    let res = send(
        router(),
        get("/billing/invoices?page=2").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        res.headers().get("location").and_then(|v| v.to_str().ok()),
        Some("https://localhost/billing/invoices?page=2")
    );
}

#[tokio::test]
async fn test_https_post_is_forbidden_and_forwarded_https_passes() {
    let post = Request::builder()
        .method("POST")
        .uri("/billing/invoices")
        .header("host", "localhost")
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(router(), post).await.status(), StatusCode::FORBIDDEN);

    let forwarded = get("/billing/invoices")
        .header("x-forwarded-proto", "https")
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(router(), forwarded).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_https_without_redirect_forbids_get() {
    let res = send(router(), get("/payments").body(Body::empty()).unwrap()).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert!(res.headers().get("location").is_none());
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let res = send(router(), get("/public").body(Body::empty()).unwrap()).await;
    assert!(res.headers().get("x-request-id").is_some());
}

#[tokio::test]
async fn test_code_declared_module_with_failing_predicate_is_server_error() {
    let mut reports = Module::new("reports");
    reports.requires_validated_claims_fallible(|claims| {
        if claims.contains("legacy") {
            Err("legacy claims cannot be evaluated")
        } else {
            Ok(true)
        }
    });
    let router = GuardServer::new(config()).mount("/reports", reports).router();

    let ok = get("/reports/q3")
        .header("x-forwarded-user", "bob")
        .header("x-forwarded-claims", "finance")
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(router.clone(), ok).await.status(), StatusCode::OK);

    let broken = get("/reports/q3")
        .header("x-forwarded-user", "bob")
        .header("x-forwarded-claims", "legacy")
        .body(Body::empty())
        .unwrap();
    assert_eq!(
        send(router.clone(), broken).await.status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );

    let no_claims = get("/reports/q3")
        .header("x-forwarded-user", "bob")
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(router, no_claims).await.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let res = send(router(), get("/nowhere").body(Body::empty()).unwrap()).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_trailing_slash_is_guarded_like_the_prefix() {
    for path in ["/account", "/account/", "/account/settings"] {
        let res = send(router(), get(path).body(Body::empty()).unwrap()).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "path {path}");
    }

    let res = send(
        router(),
        get("/account/")
            .header("x-forwarded-user", "bob")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_host_with_path_characters_is_bad_request() {
    for host in ["localhost/evil?", "good.example#"] {
        let req = Request::builder()
            .method("GET")
            .uri("/billing/pay")
            .header("host", host)
            .body(Body::empty())
            .unwrap();
        let res = send(router(), req).await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "host {host}");
        assert!(res.headers().get("location").is_none());
    }
}

#[test]
fn test_wildcard_prefix_is_rejected_before_routing() {
    let err = parse_config("[[modules]]\nname = 'a'\npath_prefix = '/{*rest}'\n").unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Validation(ref errors)
            if matches!(errors.as_slice(), [ValidationError::RoutePattern { .. }])
    ));
}
