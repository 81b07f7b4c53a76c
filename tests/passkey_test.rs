// Integration tests for the passkey ceremony endpoints
#[macro_use]
mod common;

use actix_web::{cookie::Cookie, http::StatusCode, test};
use home_loan_helper::db::{self, passkeys::NewPasskey};
use home_loan_helper::testing::{constants::TEST_EMAIL, seeded_user_with_session, test_app_state};
use serde_json::json;

use common::json_body;

#[actix_web::test]
async fn test_register_begin_with_empty_body_creates_anonymous_user() {
    let state = test_app_state().await;
    let pool = state.db.clone();
    let app = init_app!(state);

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/auth/register/begin")
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);

    let body = json_body(res).await;
    let user_id = body["userId"].as_str().unwrap();
    assert!(body["options"]["publicKey"]["challenge"].is_string());
    assert_eq!(body["options"]["publicKey"]["rp"]["id"], "localhost");

    let user = db::users::get_by_id(&pool, user_id).await.unwrap();
    assert!(user.email.is_none());
}

#[actix_web::test]
async fn test_register_begin_for_existing_email_needs_that_users_session() {
    let state = test_app_state().await;
    let (user, session) = seeded_user_with_session(&state).await;
    let app = init_app!(state);
    let begin = || {
        test::TestRequest::post()
            .uri("/api/v1/auth/register/begin")
            .set_json(json!({ "email": TEST_EMAIL }))
    };

    let res = test::call_service(&app, begin().to_request()).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body = json_body(res).await;
    assert_eq!(body["error"], "conflict");
    assert!(body.get("userId").is_none());

    let res = test::call_service(
        &app,
        begin()
            .cookie(Cookie::new("sessionToken", session.token.clone()))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(body["userId"], user.id.as_str());
    assert_eq!(body["options"]["publicKey"]["user"]["name"], TEST_EMAIL);
}

#[actix_web::test]
async fn test_register_begin_new_email_creates_user() {
    let state = test_app_state().await;
    let pool = state.db.clone();
    let app = init_app!(state);

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/auth/register/begin")
            .set_json(json!({"email": "buyer@example.com", "username": "Buyer"}))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;

    let user = db::users::find_by_email(&pool, "buyer@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(body["userId"], user.id.as_str());
    assert_eq!(user.username.as_deref(), Some("Buyer"));
}

#[actix_web::test]
async fn test_register_begin_rejects_malformed_json() {
    let app = init_app!(test_app_state().await);
    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/auth/register/begin")
            .insert_header(("content-type", "application/json"))
            .set_payload("{\"email\": ")
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_login_begin_errors() {
    let state = test_app_state().await;
    db::users::create_user(&state.db, Some("nokeys@example.com"), None, None)
        .await
        .unwrap();
    let app = init_app!(state);

    let login = |email: &str| {
        test::TestRequest::post()
            .uri("/api/v1/auth/login/begin")
            .set_json(json!({ "email": email }))
            .to_request()
    };

    let res = test::call_service(&app, login("ghost@example.com")).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(res).await["message"], "User not found");

    let res = test::call_service(&app, login("nokeys@example.com")).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        json_body(res).await["message"],
        "No passkeys registered for this user"
    );

    let res = test::call_service(&app, login("  ")).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_finish_rejects_unknown_user_and_bad_credential() {
    let state = test_app_state().await;
    let user = db::users::create_user(&state.db, Some("buyer@example.com"), None, None)
        .await
        .unwrap();
    let app = init_app!(state);

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/auth/login/finish")
            .set_json(json!({"userId": "00000000-0000-0000-0000-000000000000", "credential": {}}))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/auth/register/finish")
            .set_json(json!({"userId": user.id, "credential": {"id": 42}}))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(res).await["message"]
        .as_str()
        .unwrap()
        .starts_with("Invalid credential"));
}

#[actix_web::test]
async fn test_finish_without_user_id_is_400() {
    let app = init_app!(test_app_state().await);
    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/auth/register/finish")
            .set_json(json!({"credential": {}}))
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(res).await["error"], "invalid_request");
}

async fn seed_passkey(
    pool: &sqlx::SqlitePool,
    user_id: &str,
    credential_id: &str,
    name: &str,
) -> String {
    db::passkeys::save_passkey(
        pool,
        &NewPasskey {
            user_id,
            credential_id,
            credential_json: "{}",
            name: Some(name),
            device_type: "multi_device",
            backed_up: true,
            transports: &["internal".to_string()],
        },
    )
    .await
    .unwrap()
    .id
}

#[actix_web::test]
async fn test_list_and_delete_own_passkeys() {
    let state = test_app_state().await;
    let (user, session) = seeded_user_with_session(&state).await;
    let stranger = db::users::create_user(&state.db, Some("stranger@example.com"), None, None)
        .await
        .unwrap();
    let laptop = seed_passkey(&state.db, &user.id, "cred-laptop", "Laptop").await;
    let foreign = seed_passkey(&state.db, &stranger.id, "cred-foreign", "Theirs").await;
    let app = init_app!(state);
    let cookie = || Cookie::new("sessionToken", session.token.clone());

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/auth/passkeys")
            .cookie(cookie())
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    let passkeys = body["passkeys"].as_array().unwrap();
    assert_eq!(passkeys.len(), 1);
    assert_eq!(passkeys[0]["id"], laptop.as_str());
    assert_eq!(passkeys[0]["name"], "Laptop");
    assert_eq!(passkeys[0]["deviceType"], "multi_device");
    assert_eq!(passkeys[0]["backedUp"], true);
    assert!(passkeys[0]["createdAt"].is_string());
    assert!(passkeys[0].get("credential").is_none());

    let res = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/api/v1/auth/passkeys/{foreign}"))
            .cookie(cookie())
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(res).await["message"], "Passkey not found");

    let res = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/api/v1/auth/passkeys/{laptop}"))
            .cookie(cookie())
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json_body(res).await["success"], true);

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/auth/passkeys")
            .cookie(cookie())
            .to_request(),
    )
    .await;
    assert_eq!(json_body(res).await["passkeys"], json!([]));
}

#[actix_web::test]
async fn test_passkey_management_requires_session() {
    let app = init_app!(test_app_state().await);

    let res = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/v1/auth/passkeys").to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri("/api/v1/auth/passkeys/anything")
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}
