//! Integration tests for login, session cookies and logout.

mod common;

use common::TestHarness;
use serde_json::json;
use sv_core::Role;

fn cookie_pair(set_cookie: &str) -> String {
    set_cookie
        .split(';')
        .next()
        .expect("cookie has a name=value pair")
        .to_string()
}

#[tokio::test]
async fn login_cookie_unlocks_playback_until_logout() {
    let (h, addr) = TestHarness::with_server().await;
    let user = h.create_user("root", "hunter2", Role::Admin);
    let media = h.add_video("Clip");
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("http://{addr}/api/auth/login"))
        .json(&json!({"username": "root", "password": "hunter2"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let set_cookie = resp.headers()["set-cookie"].to_str().unwrap().to_string();
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Strict"));
    let cookie = cookie_pair(&set_cookie);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(
        cookie,
        format!("sealview_session={}", body["token"].as_str().unwrap())
    );

    let status: serde_json::Value = client
        .get(format!("http://{addr}/api/auth/status"))
        .header("cookie", &cookie)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["authenticated"], true);
    assert_eq!(status["username"], "root");
    assert_eq!(status["role"], "admin");
    assert_eq!(status["user_id"], user.to_string());

    let resp = client
        .get(format!("http://{addr}/api/playback/{media}"))
        .header("cookie", &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = client
        .post(format!("http://{addr}/api/auth/logout"))
        .header("cookie", &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 204);
    assert!(resp.headers()["set-cookie"]
        .to_str()
        .unwrap()
        .contains("Max-Age=0"));

    let resp = client
        .get(format!("http://{addr}/api/playback/{media}"))
        .header("cookie", &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn bad_password_is_401() {
    let (h, addr) = TestHarness::with_server().await;
    h.create_user("casey", "right", Role::Client);

    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/api/auth/login"))
        .json(&json!({"username": "casey", "password": "wrong"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    assert!(resp.headers().get("set-cookie").is_none());
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "unauthorized");
}

#[tokio::test]
async fn status_without_session() {
    let (_h, addr) = TestHarness::with_server().await;
    let status: serde_json::Value = reqwest::get(format!("http://{addr}/api/auth/status"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["authenticated"], false);
    assert!(status.get("username").is_none());
}

#[tokio::test]
async fn expired_session_rejected() {
    let (h, addr) = TestHarness::with_server().await;
    let user = h.create_user("casey", "pw", Role::Client);
    let expired = (chrono::Utc::now() - chrono::Duration::minutes(1)).to_rfc3339();
    sv_db::queries::auth::create_token(&h.conn(), user, "stale-session", &expired).unwrap();

    let resp = reqwest::Client::new()
        .get(format!("http://{addr}/api/playback/{}", sv_core::MediaId::new()))
        .header("authorization", "Bearer stale-session")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}
