//! Integration tests for stream issuance (`GET /api/playback/{media_id}`).

mod common;

use common::{bearer, TestHarness};
use sv_core::Role;

#[tokio::test]
async fn client_without_grant_is_forbidden() {
    let (h, addr) = TestHarness::with_server().await;
    let user = h.create_user("casey", "pw", Role::Client);
    let media = h.add_video("Quarterly review");
    let session = h.session(user);

    let resp = reqwest::Client::new()
        .get(format!("http://{addr}/api/playback/{media}"))
        .header("Authorization", bearer(&session))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "forbidden");
}

#[tokio::test]
async fn granted_client_gets_watermarked_issuance() {
    let (h, addr) = TestHarness::with_server().await;
    let admin = h.create_user("root", "pw", Role::Admin);
    let user = h.create_user("casey", "pw", Role::Client);
    let media = h.add_video("Quarterly review");
    h.grant(user, media, admin);
    let session = h.session(user);

    let resp = reqwest::Client::new()
        .get(format!("http://{addr}/api/playback/{media}"))
        .header("Authorization", bearer(&session))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["cache-control"], "no-store, private");

    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["watermarkRequired"], true);
    assert_eq!(body["allowFullscreen"], false);
    assert_eq!(body["role"], "client");
    assert_eq!(body["mediaKind"], "video");
    assert_eq!(body["title"], "Quarterly review");
    assert_eq!(body["thumbnail"], "posters/default.jpg");
    assert!(body["streamUrl"]
        .as_str()
        .unwrap()
        .starts_with("/api/stream/"));
    assert_eq!(body["refreshUrl"], format!("/api/playback/{media}"));
    assert!(body["watermarkLabel"]
        .as_str()
        .unwrap()
        .starts_with("casey #"));
    assert!(body["expiresAt"].is_string());
    assert!(body.get("claims").is_none());
}

#[tokio::test]
async fn admin_bypasses_grants_without_watermark() {
    let (h, addr) = TestHarness::with_server().await;
    let admin = h.create_user("root", "pw", Role::Admin);
    let media = h.add_video("Board deck");
    let session = h.session(admin);

    let resp = reqwest::Client::new()
        .get(format!("http://{addr}/api/playback/{media}"))
        .header("Authorization", bearer(&session))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["watermarkRequired"], false);
    assert_eq!(body["allowFullscreen"], true);
    assert_eq!(body["role"], "admin");
}

#[tokio::test]
async fn unknown_media_is_404() {
    let (h, addr) = TestHarness::with_server().await;
    let admin = h.create_user("root", "pw", Role::Admin);
    let session = h.session(admin);

    let resp = reqwest::Client::new()
        .get(format!(
            "http://{addr}/api/playback/{}",
            sv_core::MediaId::new()
        ))
        .header("Authorization", bearer(&session))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn issuance_needs_a_session() {
    let (h, addr) = TestHarness::with_server().await;
    let media = h.add_video("Quarterly review");

    let resp = reqwest::get(format!("http://{addr}/api/playback/{media}"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    assert!(resp.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn public_base_url_prefixes_links() {
    let mut config = common::test_config();
    config.server.public_base_url = "https://media.example.com/".into();
    let (h, addr) = TestHarness::with_server_config(config).await;
    let admin = h.create_user("root", "pw", Role::Admin);
    let media = h.add_video("Clip");
    let session = h.session(admin);

    let body: serde_json::Value = reqwest::Client::new()
        .get(format!("http://{addr}/api/playback/{media}"))
        .header("Authorization", bearer(&session))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(body["streamUrl"]
        .as_str()
        .unwrap()
        .starts_with("https://media.example.com/api/stream/"));
}

#[tokio::test]
async fn issuance_rate_limit_returns_429() {
    let mut config = common::test_config();
    config.streaming.issue_rate_per_minute = 2;
    let (h, addr) = TestHarness::with_server_config(config).await;
    let admin = h.create_user("root", "pw", Role::Admin);
    let media = h.add_video("Clip");
    let session = h.session(admin);
    let client = reqwest::Client::new();

    let mut statuses = Vec::new();
    for _ in 0..3 {
        let resp = client
            .get(format!("http://{addr}/api/playback/{media}"))
            .header("Authorization", bearer(&session))
            .send()
            .await
            .unwrap();
        statuses.push(resp.status().as_u16());
    }
    assert_eq!(statuses, vec![200, 200, 429]);
}

#[tokio::test]
async fn issuance_budget_is_per_user() {
    let mut config = common::test_config();
    config.streaming.issue_rate_per_minute = 1;
    let (h, addr) = TestHarness::with_server_config(config).await;
    let alice = h.create_user("alice", "pw", Role::Admin);
    let bob = h.create_user("bob", "pw", Role::Admin);
    let media = h.add_video("Clip");
    let client = reqwest::Client::new();

    let issue = move |session: String| {
        let client = client.clone();
        async move {
            client
                .get(format!("http://{addr}/api/playback/{media}"))
                .header("Authorization", bearer(&session))
                .send()
                .await
                .unwrap()
                .status()
                .as_u16()
        }
    };

    let alice_session = h.session(alice);
    assert_eq!(issue(alice_session.clone()).await, 200);
    assert_eq!(issue(alice_session).await, 429);
    assert_eq!(issue(h.session(bob)).await, 200);
}
