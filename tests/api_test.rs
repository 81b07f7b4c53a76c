// Integration tests for routing, middleware and error responses
#[macro_use]
mod common;

use actix_web::{http::StatusCode, test};
use home_loan_helper::testing::{
    test_app_state, test_app_state_with, test_settings, FakeOAuthClient,
};

use common::{header, json_body};

#[actix_web::test]
async fn test_health_check() {
    let app = init_app!(test_app_state().await);
    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/healthz")
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["message"], "Passkey-only API is running");
    assert!(body["timestamp"].is_string());
}

#[actix_web::test]
async fn test_security_headers_on_every_response() {
    let app = init_app!(test_app_state().await);
    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/healthz")
            .to_request(),
    )
    .await;

    assert_eq!(header(&res, "x-content-type-options"), Some("nosniff"));
    assert_eq!(header(&res, "x-frame-options"), Some("SAMEORIGIN"));
    assert_eq!(header(&res, "x-download-options"), Some("noopen"));
    assert_eq!(header(&res, "x-dns-prefetch-control"), Some("off"));
    assert_eq!(header(&res, "referrer-policy"), Some("no-referrer"));
    assert!(header(&res, "strict-transport-security").is_some());
    assert!(header(&res, "content-security-policy")
        .unwrap()
        .contains("img-src 'self' data: https:"));
}

#[actix_web::test]
async fn test_cors_allows_only_frontend_origin() {
    let app = init_app!(test_app_state().await);

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/healthz")
            .insert_header(("Origin", "http://localhost:5173"))
            .to_request(),
    )
    .await;
    assert_eq!(
        header(&res, "access-control-allow-origin"),
        Some("http://localhost:5173")
    );
    assert_eq!(header(&res, "access-control-allow-credentials"), Some("true"));

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/healthz")
            .insert_header(("Origin", "https://evil.example"))
            .to_request(),
    )
    .await;
    assert!(header(&res, "access-control-allow-origin").is_none());
}

#[actix_web::test]
async fn test_unknown_route_is_json_404() {
    let app = init_app!(test_app_state().await);
    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/nope")
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body = json_body(res).await;
    assert_eq!(body["error"], "not_found");
    assert_eq!(body["message"], "Route GET /api/v1/nope not found");
}

#[actix_web::test]
async fn test_malformed_json_is_400() {
    let app = init_app!(test_app_state().await);
    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/auth/login/begin")
            .insert_header(("content-type", "application/json"))
            .set_payload("{not json")
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = json_body(res).await;
    assert_eq!(body["error"], "invalid_request");
}

#[actix_web::test]
async fn test_openapi_document() {
    let app = init_app!(test_app_state().await);
    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/docs/json")
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(body["openapi"], "3.0.0");
    assert_eq!(body["info"]["title"], "Home Loan Helper API");
    assert!(body["info"]["description"]
        .as_str()
        .unwrap()
        .contains("passkey authentication"));
    assert!(body["paths"]["/api/v1/loans/compare"]["get"].is_object());
}

#[actix_web::test]
async fn test_rate_limit_headers_and_429() {
    let mut settings = test_settings();
    settings.rate_limit.max_requests = 2;
    let app = init_app!(test_app_state_with(settings, FakeOAuthClient::default()).await);

    let first = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/healthz")
            .to_request(),
    )
    .await;
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(header(&first, "x-ratelimit-limit"), Some("2"));
    assert_eq!(header(&first, "x-ratelimit-remaining"), Some("1"));
    assert!(header(&first, "x-ratelimit-reset").is_some());

    let second = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/healthz")
            .to_request(),
    )
    .await;
    assert_eq!(header(&second, "x-ratelimit-remaining"), Some("0"));

    let third = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/healthz")
            .to_request(),
    )
    .await;
    assert_eq!(third.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(header(&third, "retry-after").is_some());
    let body = json_body(third).await;
    assert_eq!(body["error"], "rate_limited");
}

#[actix_web::test]
async fn test_rate_limit_can_be_disabled() {
    let mut settings = test_settings();
    settings.rate_limit.enabled = false;
    settings.rate_limit.max_requests = 1;
    let app = init_app!(test_app_state_with(settings, FakeOAuthClient::default()).await);

    for _ in 0..3 {
        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/v1/healthz")
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert!(header(&res, "x-ratelimit-limit").is_none());
    }
}

#[actix_web::test]
async fn test_rate_limit_ignores_spoofed_forwarded_for() {
    let mut settings = test_settings();
    settings.rate_limit.max_requests = 2;
    let app = init_app!(test_app_state_with(settings, FakeOAuthClient::default()).await);

    let mut statuses = Vec::new();
    for i in 0..4 {
        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/v1/healthz")
                .peer_addr("192.0.2.10:50000".parse().unwrap())
                .insert_header(("x-forwarded-for", format!("10.0.0.{i}")))
                .to_request(),
        )
        .await;
        statuses.push(res.status());
    }

    assert_eq!(
        statuses,
        vec![
            StatusCode::OK,
            StatusCode::OK,
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::TOO_MANY_REQUESTS
        ]
    );
}

#[actix_web::test]
async fn test_rate_limit_trusts_forwarded_for_behind_proxy() {
    let mut settings = test_settings();
    settings.rate_limit.max_requests = 1;
    settings.rate_limit.trust_proxy = true;
    let app = init_app!(test_app_state_with(settings, FakeOAuthClient::default()).await);

    for client in ["198.51.100.1", "198.51.100.2"] {
        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/v1/healthz")
                .peer_addr("127.0.0.1:8080".parse().unwrap())
                .insert_header(("x-forwarded-for", client))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
    }
}
