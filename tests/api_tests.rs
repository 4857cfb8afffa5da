use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use boardarr::api::{self, AppState};
use boardarr::config::Config;
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;

/// In-memory SQLite needs a single pooled connection, otherwise each
/// connection sees its own empty database.
async fn spawn_app() -> (Router, Arc<AppState>) {
    let mut config = Config::default();
    config.general.database_url = "sqlite::memory:".to_string();
    config.general.max_db_connections = 1;
    config.general.min_db_connections = 1;

    let state = api::create_app_state_from_config(config)
        .await
        .expect("Failed to create app state");
    (api::router(state.clone()), state)
}

fn request(method: &str, uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn json_request(
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    body: serde_json::Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref());
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn login(app: &Router, username: &str, password: &str) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/auth/login",
            None,
            serde_json::json!({ "username": username, "password": password }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("login must set a session cookie")
        .to_str()
        .unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

async fn seed_user(state: &AppState, username: &str, is_admin: bool) {
    state
        .store
        .create_user(username, "test password", is_admin)
        .await
        .unwrap();
}

async fn create_board(app: &Router, cookie: &str, title: &str) -> i64 {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/boards",
            Some(cookie),
            serde_json::json!({ "title": title }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

/// Issue an access token for a board, returning (token_id, secret).
async fn issue_token(
    app: &Router,
    cookie: &str,
    board_id: i64,
    body: serde_json::Value,
) -> (i64, String) {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/v1/boards/{board_id}/access-tokens"),
            Some(cookie),
            body,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    let id = body["data"]["id"].as_i64().unwrap();
    let secret = body["data"]["secret"].as_str().unwrap().to_string();
    (id, secret)
}

#[tokio::test]
async fn health_is_unauthenticated() {
    let (app, _state) = spawn_app().await;

    let response = app
        .oneshot(request("GET", "/health", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "up");
}

#[tokio::test]
async fn boards_require_a_session() {
    let (app, _state) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(request("GET", "/api/v1/boards", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/boards",
            None,
            serde_json::json!({ "title": "Kitchen" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn board_crud_roundtrip() {
    let (app, state) = spawn_app().await;
    seed_user(&state, "alice", false).await;
    let cookie = login(&app, "alice", "test password").await;

    let board_id = create_board(&app, &cookie, "Kitchen Display").await;

    let response = app
        .clone()
        .oneshot(request("GET", "/api/v1/boards", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["title"], "Kitchen Display");

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/v1/boards/{board_id}"),
            Some(&cookie),
            serde_json::json!({ "description": "Wall tablet", "layout_config": { "columns": 4 } }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["title"], "Kitchen Display");
    assert_eq!(body["data"]["description"], "Wall tablet");
    assert_eq!(body["data"]["layout_config"]["columns"], 4);

    let response = app
        .clone()
        .oneshot(request(
            "DELETE",
            &format!("/api/v1/boards/{board_id}"),
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(request(
            "GET",
            &format!("/api/v1/boards/{board_id}"),
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn duplicate_titles_conflict_per_owner() {
    let (app, state) = spawn_app().await;
    seed_user(&state, "alice", false).await;
    seed_user(&state, "bob", false).await;
    let alice = login(&app, "alice", "test password").await;
    let bob = login(&app, "bob", "test password").await;

    create_board(&app, &alice, "Kitchen").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/boards",
            Some(&alice),
            serde_json::json!({ "title": "Kitchen" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // The uniqueness rule is per owner, not global.
    create_board(&app, &bob, "Kitchen").await;

    // Renaming onto an existing title conflicts the same way.
    let other = create_board(&app, &alice, "Hallway").await;
    let response = app
        .oneshot(json_request(
            "PUT",
            &format!("/api/v1/boards/{other}"),
            Some(&alice),
            serde_json::json!({ "title": "Kitchen" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn ownership_gates_board_access() {
    let (app, state) = spawn_app().await;
    seed_user(&state, "alice", false).await;
    seed_user(&state, "bob", false).await;
    seed_user(&state, "root", true).await;
    let alice = login(&app, "alice", "test password").await;
    let bob = login(&app, "bob", "test password").await;
    let root = login(&app, "root", "test password").await;

    let board_id = create_board(&app, &alice, "Kitchen").await;

    // A logged-in non-owner is forbidden, not unauthorized.
    let uri = format!("/api/v1/boards/{board_id}");
    let response = app
        .clone()
        .oneshot(request("GET", &uri, Some(&bob)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &uri,
            Some(&bob),
            serde_json::json!({ "title": "Hijacked" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Admins bypass ownership everywhere.
    let response = app
        .clone()
        .oneshot(request("GET", &uri, Some(&root)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(request("GET", "/api/v1/boards", Some(&root)))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    // Bob's own listing stays empty.
    let response = app
        .oneshot(request("GET", "/api/v1/boards", Some(&bob)))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn access_token_grants_anonymous_read() {
    let (app, state) = spawn_app().await;
    seed_user(&state, "alice", false).await;
    let cookie = login(&app, "alice", "test password").await;
    let board_id = create_board(&app, &cookie, "Kitchen").await;

    let (token_id, secret) =
        issue_token(&app, &cookie, board_id, serde_json::json!({ "name": "wall tablet" })).await;

    // All three carriers work without any session.
    let uri = format!("/api/v1/boards/{board_id}");
    let response = app
        .clone()
        .oneshot(request(
            "GET",
            &format!("{uri}?access_token={secret}"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["title"], "Kitchen");
    assert!(body["data"]["widgets"].as_array().is_some());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(uri.as_str())
                .header(header::AUTHORIZATION, format!("Bearer {secret}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(uri.as_str())
                .header("x-access-token", &secret)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Usage is recorded on the token row.
    let response = app
        .oneshot(request(
            "GET",
            &format!("/api/v1/boards/{board_id}/access-tokens"),
            Some(&cookie),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    let listed = &body["data"][0];
    assert_eq!(listed["id"].as_i64().unwrap(), token_id);
    assert_eq!(listed["name"], "wall tablet");
    assert!(!listed["last_used_at"].is_null());
    assert!(listed.get("secret").is_none());
    assert!(listed.get("token_hash").is_none());
}

#[tokio::test]
async fn token_usage_timestamp_never_moves_backwards() {
    let (app, state) = spawn_app().await;
    seed_user(&state, "alice", false).await;
    let cookie = login(&app, "alice", "test password").await;
    let board_id = create_board(&app, &cookie, "Kitchen").await;
    let (token_id, secret) = issue_token(&app, &cookie, board_id, serde_json::json!({})).await;

    let read_board = || {
        request(
            "GET",
            &format!("/api/v1/boards/{board_id}?access_token={secret}"),
            None,
        )
    };
    let last_used = |body: serde_json::Value| -> chrono::DateTime<chrono::Utc> {
        let listed = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .find(|t| t["id"].as_i64() == Some(token_id))
            .unwrap();
        listed["last_used_at"].as_str().unwrap().parse().unwrap()
    };

    let response = app.clone().oneshot(read_board()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(request(
            "GET",
            &format!("/api/v1/boards/{board_id}/access-tokens"),
            Some(&cookie),
        ))
        .await
        .unwrap();
    let first = last_used(body_json(response).await);

    let response = app.clone().oneshot(read_board()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(request(
            "GET",
            &format!("/api/v1/boards/{board_id}/access-tokens"),
            Some(&cookie),
        ))
        .await
        .unwrap();
    let second = last_used(body_json(response).await);

    assert!(second >= first);
}

#[tokio::test]
async fn access_tokens_never_authorize_writes() {
    let (app, state) = spawn_app().await;
    seed_user(&state, "alice", false).await;
    let cookie = login(&app, "alice", "test password").await;
    let board_id = create_board(&app, &cookie, "Kitchen").await;
    let (_, secret) = issue_token(&app, &cookie, board_id, serde_json::json!({})).await;

    let mut req = json_request(
        "PUT",
        &format!("/api/v1/boards/{board_id}"),
        None,
        serde_json::json!({ "title": "Renamed" }),
    );
    req.headers_mut().insert(
        header::AUTHORIZATION,
        format!("Bearer {secret}").parse().unwrap(),
    );
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let mut req = json_request(
        "POST",
        &format!("/api/v1/boards/{board_id}/widgets"),
        None,
        serde_json::json!({ "type": "clock" }),
    );
    req.headers_mut().insert(
        header::AUTHORIZATION,
        format!("Bearer {secret}").parse().unwrap(),
    );
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn mismatched_token_falls_through_to_session() {
    let (app, state) = spawn_app().await;
    seed_user(&state, "alice", false).await;
    let cookie = login(&app, "alice", "test password").await;
    let board_a = create_board(&app, &cookie, "Kitchen").await;
    let board_b = create_board(&app, &cookie, "Hallway").await;
    let (_, secret_a) = issue_token(&app, &cookie, board_a, serde_json::json!({})).await;

    // A valid token for another board is not a credential for this one.
    let uri = format!("/api/v1/boards/{board_b}?access_token={secret_a}");
    let response = app
        .clone()
        .oneshot(request("GET", &uri, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Garbage never resolves.
    let response = app
        .clone()
        .oneshot(request(
            "GET",
            &format!("/api/v1/boards/{board_b}?access_token=not-a-real-token"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // With a session alongside, the owner still gets through.
    let response = app
        .oneshot(request("GET", &uri, Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["title"], "Hallway");
}

#[tokio::test]
async fn revoked_and_expired_tokens_stop_resolving() {
    let (app, state) = spawn_app().await;
    seed_user(&state, "alice", false).await;
    let cookie = login(&app, "alice", "test password").await;
    let board_id = create_board(&app, &cookie, "Kitchen").await;

    let (token_id, secret) = issue_token(&app, &cookie, board_id, serde_json::json!({})).await;
    let uri = format!("/api/v1/boards/{board_id}?access_token={secret}");

    let response = app
        .clone()
        .oneshot(request("GET", &uri, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Soft revocation.
    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/api/v1/boards/{board_id}/access-tokens/{token_id}"),
            Some(&cookie),
            serde_json::json!({ "is_active": false }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["is_active"], false);

    let response = app
        .clone()
        .oneshot(request("GET", &uri, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Reactivate, then expire it in the past; still unusable.
    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/api/v1/boards/{board_id}/access-tokens/{token_id}"),
            Some(&cookie),
            serde_json::json!({ "is_active": true, "expires_at": "2020-01-01T00:00:00Z" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(request("GET", &uri, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Clearing the expiry (explicit null) makes it valid again.
    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/api/v1/boards/{board_id}/access-tokens/{token_id}"),
            Some(&cookie),
            serde_json::json!({ "expires_at": null }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["data"]["expires_at"].is_null());

    let response = app
        .clone()
        .oneshot(request("GET", &uri, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Hard delete kills it for good.
    let response = app
        .clone()
        .oneshot(request(
            "DELETE",
            &format!("/api/v1/boards/{board_id}/access-tokens/{token_id}"),
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(request("GET", &uri, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_management_is_board_scoped() {
    let (app, state) = spawn_app().await;
    seed_user(&state, "alice", false).await;
    seed_user(&state, "bob", false).await;
    let alice = login(&app, "alice", "test password").await;
    let bob = login(&app, "bob", "test password").await;

    let board_a = create_board(&app, &alice, "Kitchen").await;
    let board_b = create_board(&app, &bob, "Office").await;
    let (token_id, _) = issue_token(&app, &alice, board_a, serde_json::json!({})).await;

    // A non-owner cannot even list another board's tokens.
    let response = app
        .clone()
        .oneshot(request(
            "GET",
            &format!("/api/v1/boards/{board_a}/access-tokens"),
            Some(&bob),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Addressing the token through the wrong board is a 404.
    let response = app
        .oneshot(request(
            "DELETE",
            &format!("/api/v1/boards/{board_b}/access-tokens/{token_id}"),
            Some(&bob),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn widget_types_are_validated() {
    let (app, state) = spawn_app().await;
    seed_user(&state, "alice", false).await;
    let cookie = login(&app, "alice", "test password").await;
    let board_id = create_board(&app, &cookie, "Kitchen").await;
    let uri = format!("/api/v1/boards/{board_id}/widgets");

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &uri,
            Some(&cookie),
            serde_json::json!({ "type": "flux_capacitor" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &uri,
            Some(&cookie),
            serde_json::json!({
                "type": "clock",
                "config": { "timezone": "Europe/Berlin" },
                "position": { "x": 0, "y": 0, "w": 2, "h": 1 }
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    let widget_id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["type"], "clock");

    // Updating to a bogus type is rejected the same way.
    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("{uri}/{widget_id}"),
            Some(&cookie),
            serde_json::json!({ "type": "flux_capacitor" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Widgets ride along on the board read payload.
    let response = app
        .oneshot(request(
            "GET",
            &format!("/api/v1/boards/{board_id}"),
            Some(&cookie),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["widgets"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["widgets"][0]["config"]["timezone"], "Europe/Berlin");
}

#[tokio::test]
async fn settings_are_created_lazily() {
    let (app, state) = spawn_app().await;
    seed_user(&state, "alice", false).await;
    let cookie = login(&app, "alice", "test password").await;
    let board_id = create_board(&app, &cookie, "Kitchen").await;
    let uri = format!("/api/v1/boards/{board_id}/settings");

    // First read materializes the default row.
    let response = app
        .clone()
        .oneshot(request("GET", &uri, Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["board_id"].as_i64().unwrap(), board_id);
    assert_eq!(body["data"]["auto_rotate_pages"], false);
    assert_eq!(body["data"]["lockout_mode"], false);

    // Partial update leaves unrelated fields alone.
    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &uri,
            Some(&cookie),
            serde_json::json!({ "orientation": "portrait", "lockout_mode": true }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["orientation"], "portrait");
    assert_eq!(body["data"]["lockout_mode"], true);
    assert_eq!(body["data"]["auto_rotate_pages"], false);

    let response = app
        .oneshot(request("GET", &uri, Some(&cookie)))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["orientation"], "portrait");
}
