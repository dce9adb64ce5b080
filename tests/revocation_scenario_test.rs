//! End-to-end walk through grant, issuance, streaming and revocation.

mod common;

use chrono::{Duration, Utc};
use common::{bearer, token_of, video_bytes, TestHarness};
use serde_json::{json, Value};
use sv_core::{Error, Role};

#[tokio::test]
async fn revocation_blocks_new_issuance_but_not_live_tokens() {
    let (h, addr) = TestHarness::with_server().await;
    let client = reqwest::Client::new();

    let root = h.create_user("root", "pw", Role::Admin);
    let user = h.create_user("casey", "pw", Role::Client);
    let media = h.add_video("Board Meeting");
    let admin_auth = bearer(&h.session(root));
    let user_auth = bearer(&h.session(user));

    // Admin grants casey access.
    let resp = client
        .post(format!("http://{addr}/api/admin/grants"))
        .header("authorization", &admin_auth)
        .json(&json!({"userId": user, "mediaId": media}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // Casey gets a watermarked stream.
    let issued: Value = client
        .get(format!("http://{addr}/api/playback/{media}"))
        .header("authorization", &user_auth)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(issued["watermarkRequired"], true);
    let stream_url = issued["streamUrl"].as_str().unwrap().to_string();
    let token = token_of(&stream_url);

    let resp = client
        .get(format!("http://{addr}{stream_url}"))
        .header("range", "bytes=100-199")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 206);
    assert_eq!(&resp.bytes().await.unwrap()[..], &video_bytes()[100..200]);

    // Admin revokes.
    let resp = client
        .delete(format!("http://{addr}/api/admin/grants/{user}/{media}"))
        .header("authorization", &admin_auth)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 204);

    // The token already handed out keeps working until it expires.
    let resp = client
        .get(format!("http://{addr}{stream_url}"))
        .header("range", "bytes=0-9")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 206);

    let expires_at: chrono::DateTime<Utc> =
        issued["expiresAt"].as_str().unwrap().parse().unwrap();
    let claims = h
        .ctx
        .tokens
        .validate_at(&token, expires_at - Duration::seconds(1))
        .unwrap();
    assert_eq!(claims.user_id, user);
    assert!(matches!(
        h.ctx
            .tokens
            .validate_at(&token, expires_at + Duration::seconds(1)),
        Err(Error::TokenExpired)
    ));

    // New issuance is refused.
    let resp = client
        .get(format!("http://{addr}/api/playback/{media}"))
        .header("authorization", &user_auth)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    // The audit feed saw the whole story.
    let events: Value = client
        .get(format!("http://{addr}/api/admin/audit?limit=500"))
        .header("authorization", &admin_auth)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let kinds: Vec<&str> = events
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["payload"]["type"].as_str().unwrap())
        .collect();
    for kind in ["grant_created", "token_issued", "grant_revoked", "access_denied"] {
        assert!(kinds.contains(&kind), "missing {kind} in {kinds:?}");
    }
}
