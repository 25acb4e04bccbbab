mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

const LOGIN: &str = "/api/v1/auth/login";
const REGISTER: &str = "/api/v1/auth/register";

#[tokio::test]
async fn login_returns_usable_token() -> Result<()> {
    let payload = json!({ "username": "admin", "password": "admin-password" });
    let (status, body) = common::send(common::test_app(), common::post_json(LOGIN, &payload)).await?;

    assert_eq!(status, StatusCode::OK, "unexpected body: {}", body);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["token_type"], "Bearer");
    assert_eq!(body["data"]["expires_in"], 3600);

    let token = body["data"]["token"].as_str().expect("token string");
    let header = format!("Bearer {}", token);

    let (status, body) = common::send(
        common::test_app(),
        common::get("/api/v1/admin/ping", Some(header.as_str())),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["subject_id"], "1");
    Ok(())
}

#[tokio::test]
async fn user_token_is_forbidden_on_admin_route() -> Result<()> {
    let payload = json!({ "username": "alice", "password": "alice-password" });
    let (status, body) = common::send(common::test_app(), common::post_json(LOGIN, &payload)).await?;
    assert_eq!(status, StatusCode::OK);

    let header = format!("Bearer {}", body["data"]["token"].as_str().expect("token string"));
    let (status, _) = common::send(
        common::test_app(),
        common::get("/api/v1/admin/ping", Some(header.as_str())),
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn wrong_password_and_unknown_user_are_indistinguishable() -> Result<()> {
    let wrong = json!({ "username": "alice", "password": "guess" });
    let unknown = json!({ "username": "mallory", "password": "guess" });

    let (wrong_status, wrong_body) = common::send(common::test_app(), common::post_json(LOGIN, &wrong)).await?;
    let (unknown_status, unknown_body) =
        common::send(common::test_app(), common::post_json(LOGIN, &unknown)).await?;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, unknown_body);
    assert_eq!(wrong_body["success"], false);
    Ok(())
}

#[tokio::test]
async fn empty_credentials_are_a_bad_request() -> Result<()> {
    let payload = json!({ "username": "", "password": "" });
    let (status, body) = common::send(common::test_app(), common::post_json(LOGIN, &payload)).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
    Ok(())
}

#[tokio::test]
async fn login_without_json_body_gets_error_envelope() -> Result<()> {
    let request = axum::http::Request::builder()
        .method("POST")
        .uri(LOGIN)
        .body(axum::body::Body::empty())?;

    let (status, body) = common::send(common::test_app(), request).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
    Ok(())
}

#[tokio::test]
async fn malformed_json_gets_error_envelope() -> Result<()> {
    for path in [LOGIN, REGISTER] {
        let request = axum::http::Request::builder()
            .method("POST")
            .uri(path)
            .header(axum::http::header::CONTENT_TYPE, "application/json")
            .body(axum::body::Body::from("{\"username\": "))?;

        let (status, body) = common::send(common::test_app(), request).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", path);
        assert_eq!(body["error"]["code"], "BAD_REQUEST", "{}", path);
    }
    Ok(())
}

#[tokio::test]
async fn register_creates_user_with_default_role() -> Result<()> {
    let payload = json!({ "username": "bob", "password": "bob-password" });
    let (status, body) = common::send(common::test_app(), common::post_json(REGISTER, &payload)).await?;

    assert_eq!(status, StatusCode::CREATED, "unexpected body: {}", body);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["username"], "bob");
    assert_eq!(body["data"]["role"], "user");
    assert!(body["data"]["id"].is_string());
    assert!(body["data"].get("password").is_none());
    Ok(())
}

#[tokio::test]
async fn register_then_login() -> Result<()> {
    // Registrations are held in memory, so both requests must hit the same app
    let app = common::test_app();
    let credentials = json!({ "username": "bob", "password": "bob-password" });

    let (status, registered) = common::send(app.clone(), common::post_json(REGISTER, &credentials)).await?;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = common::send(app.clone(), common::post_json(LOGIN, &credentials)).await?;
    assert_eq!(status, StatusCode::OK, "unexpected body: {}", body);

    let header = format!("Bearer {}", body["data"]["token"].as_str().expect("token string"));
    let (status, whoami) = common::send(
        app.clone(),
        common::get("/api/v1/auth/whoami", Some(header.as_str())),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(whoami["data"]["subject_id"], registered["data"]["id"]);
    assert_eq!(whoami["data"]["role"], "user");

    // Default role does not reach admin routes
    let (status, _) = common::send(app, common::get("/api/v1/admin/ping", Some(header.as_str()))).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn register_taken_username_is_a_conflict() -> Result<()> {
    let app = common::test_app();

    let existing = json!({ "username": "alice", "password": "whatever" });
    let (status, body) = common::send(app.clone(), common::post_json(REGISTER, &existing)).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");

    let fresh = json!({ "username": "carol", "password": "carol-password" });
    let (status, _) = common::send(app.clone(), common::post_json(REGISTER, &fresh)).await?;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = common::send(app.clone(), common::post_json(REGISTER, &fresh)).await?;
    assert_eq!(status, StatusCode::CONFLICT);

    // The seeded account still logs in with its own password
    let login = json!({ "username": "alice", "password": "alice-password" });
    let (status, _) = common::send(app, common::post_json(LOGIN, &login)).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn register_with_empty_fields_is_a_bad_request() -> Result<()> {
    for payload in [
        json!({ "username": "", "password": "pw" }),
        json!({ "username": "dave", "password": "" }),
        json!({}),
    ] {
        let (status, body) = common::send(common::test_app(), common::post_json(REGISTER, &payload)).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", payload);
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
    }
    Ok(())
}
