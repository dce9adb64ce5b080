//! Integration tests for the admin grant endpoints.

mod common;

use common::{bearer, TestHarness};
use serde_json::{json, Value};
use sv_access::AccessGrantStore;
use sv_core::{MediaId, Role, UserId};

struct Admin {
    client: reqwest::Client,
    base: String,
    auth: String,
}

impl Admin {
    fn new(addr: std::net::SocketAddr, session: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base: format!("http://{addr}/api/admin"),
            auth: bearer(session),
        }
    }

    async fn grant(&self, user: UserId, media: MediaId) -> reqwest::Response {
        self.client
            .post(format!("{}/grants", self.base))
            .header("authorization", &self.auth)
            .json(&json!({"userId": user, "mediaId": media}))
            .send()
            .await
            .unwrap()
    }

    async fn revoke(&self, user: UserId, media: MediaId) -> reqwest::Response {
        self.client
            .delete(format!("{}/grants/{user}/{media}", self.base))
            .header("authorization", &self.auth)
            .send()
            .await
            .unwrap()
    }

    async fn get(&self, path: &str) -> Value {
        let resp = self
            .client
            .get(format!("{}{path}", self.base))
            .header("authorization", &self.auth)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200, "GET {path}");
        resp.json().await.unwrap()
    }
}

#[tokio::test]
async fn grant_is_idempotent() {
    let (h, addr) = TestHarness::with_server().await;
    let root = h.create_user("root", "pw", Role::Admin);
    let user = h.create_user("casey", "pw", Role::Client);
    let media = h.add_video("Clip");
    let admin = Admin::new(addr, &h.session(root));

    let first = admin.grant(user, media).await;
    assert_eq!(first.status(), 200);
    let first: Value = first.json().await.unwrap();
    assert_eq!(first["userId"], user.to_string());
    assert_eq!(first["grantedBy"], root.to_string());

    let second: Value = admin.grant(user, media).await.json().await.unwrap();
    assert_eq!(second["grantedAt"], first["grantedAt"]);

    let by_user = admin.get(&format!("/users/{user}/grants")).await;
    assert_eq!(by_user["mediaIds"], json!([media.to_string()]));
    let by_media = admin.get(&format!("/media/{media}/grants")).await;
    assert_eq!(by_media["userIds"], json!([user.to_string()]));
}

#[tokio::test]
async fn revoke_is_idempotent() {
    let (h, addr) = TestHarness::with_server().await;
    let root = h.create_user("root", "pw", Role::Admin);
    let user = h.create_user("casey", "pw", Role::Client);
    let media = h.add_video("Clip");
    h.grant(user, media, root);
    let admin = Admin::new(addr, &h.session(root));

    assert_eq!(admin.revoke(user, media).await.status(), 204);
    assert_eq!(admin.revoke(user, media).await.status(), 204);

    let by_user = admin.get(&format!("/users/{user}/grants")).await;
    assert_eq!(by_user["mediaIds"], json!([]));
}

#[tokio::test]
async fn unknown_ids_are_404() {
    let (h, addr) = TestHarness::with_server().await;
    let root = h.create_user("root", "pw", Role::Admin);
    let media = h.add_video("Clip");
    let admin = Admin::new(addr, &h.session(root));

    let resp = admin.grant(UserId::new(), media).await;
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "not_found");

    assert_eq!(admin.revoke(root, MediaId::new()).await.status(), 404);
}

#[tokio::test]
async fn clients_cannot_manage_grants() {
    let (h, addr) = TestHarness::with_server().await;
    let user = h.create_user("casey", "pw", Role::Client);
    let media = h.add_video("Clip");
    let as_client = Admin::new(addr, &h.session(user));

    let resp = as_client.grant(user, media).await;
    assert_eq!(resp.status(), 403);
    assert!(h.ctx.grants.list_for_user(user).unwrap().is_empty());
}

#[tokio::test]
async fn catalog_listings() {
    let (h, addr) = TestHarness::with_server().await;
    let root = h.create_user("root", "pw", Role::Admin);
    h.create_user("casey", "pw", Role::Client);
    let media = h.add_video("Clip");
    let admin = Admin::new(addr, &h.session(root));

    let users = admin.get("/users").await;
    let names: Vec<&str> = users
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["username"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"root"));
    assert!(names.contains(&"casey"));
    assert!(users[0].get("passwordHash").is_none());

    let items = admin.get("/media").await;
    assert_eq!(items.as_array().unwrap().len(), 1);
    assert_eq!(items[0]["id"], media.to_string());
    assert_eq!(items[0]["kind"], "video");
    assert_eq!(items[0]["title"], "Clip");
}
