//! Integration tests for the viewer page (`GET /api/viewer/{media_id}`).

mod common;

use common::{bearer, TestHarness};
use sv_core::config::ViewerMode;
use sv_core::{MediaKind, Role};

/// Nonce advertised in the `script-src` directive.
fn csp_nonce(csp: &str) -> String {
    let start = csp.find("'nonce-").expect("csp carries a nonce") + "'nonce-".len();
    let end = csp[start..].find('\'').expect("nonce is quoted") + start;
    csp[start..end].to_string()
}

async fn fetch_page(
    addr: std::net::SocketAddr,
    session: &str,
    media: sv_core::MediaId,
) -> reqwest::Response {
    reqwest::Client::new()
        .get(format!("http://{addr}/api/viewer/{media}"))
        .header("authorization", bearer(session))
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn isolated_video_page() {
    let (h, addr) = TestHarness::with_server().await;
    let admin = h.create_user("root", "pw", Role::Admin);
    let user = h.create_user("casey", "pw", Role::Client);
    let media = h.add_video("Quarterly <Review>");
    h.grant(user, media, admin);

    let resp = fetch_page(addr, &h.session(user), media).await;
    assert_eq!(resp.status(), 200);

    let headers = resp.headers().clone();
    assert!(headers["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/html"));
    assert_eq!(headers["x-frame-options"], "SAMEORIGIN");
    assert_eq!(headers["cache-control"], "no-store, private");
    assert_eq!(headers["cross-origin-opener-policy"], "same-origin");

    let csp = headers["content-security-policy"].to_str().unwrap().to_string();
    assert!(csp.contains("default-src 'none'"));
    assert!(csp.contains("frame-ancestors 'self'"));
    let nonce = csp_nonce(&csp);
    assert_eq!(nonce.len(), 32);

    let html = resp.text().await.unwrap();
    assert!(html.contains(&format!(r#"<script nonce="{nonce}">"#)));
    assert!(html.contains("SealView.host("));
    assert!(html.contains(r#"data-sandbox="allow-scripts""#));
    assert!(!html.contains("allow-same-origin"));
    assert!(html.contains("Quarterly &lt;Review&gt;"));
    assert!(!html.contains("Quarterly <Review>"));
}

#[tokio::test]
async fn nonce_changes_per_response() {
    let (h, addr) = TestHarness::with_server().await;
    let admin = h.create_user("root", "pw", Role::Admin);
    let media = h.add_video("Clip");
    let session = h.session(admin);

    let a = fetch_page(addr, &session, media).await;
    let b = fetch_page(addr, &session, media).await;
    let nonce_a = csp_nonce(a.headers()["content-security-policy"].to_str().unwrap());
    let nonce_b = csp_nonce(b.headers()["content-security-policy"].to_str().unwrap());
    assert_ne!(nonce_a, nonce_b);
}

#[tokio::test]
async fn document_falls_back_to_inline() {
    let (h, addr) = TestHarness::with_server().await;
    let admin = h.create_user("root", "pw", Role::Admin);
    let media = h.add_media("Handbook", MediaKind::Document, "handbook.pdf", b"%PDF-1.7");

    let resp = fetch_page(addr, &h.session(admin), media).await;
    assert_eq!(resp.status(), 200);
    let html = resp.text().await.unwrap();
    assert!(html.contains("SealView.mount("));
    assert!(!html.contains("SealView.host("));
}

#[tokio::test]
async fn inline_mode_config() {
    let mut config = common::test_config();
    config.viewer.mode = ViewerMode::Inline;
    let (h, addr) = TestHarness::with_server_config(config).await;
    let admin = h.create_user("root", "pw", Role::Admin);
    let media = h.add_video("Clip");

    let html = fetch_page(addr, &h.session(admin), media)
        .await
        .text()
        .await
        .unwrap();
    assert!(html.contains("SealView.mount("));
    assert!(html.contains(r#"source: "fetch""#));
}

#[tokio::test]
async fn watermark_only_for_clients() {
    let (h, addr) = TestHarness::with_server().await;
    let admin = h.create_user("root", "pw", Role::Admin);
    let user = h.create_user("casey", "pw", Role::Client);
    let media = h.add_video("Clip");
    h.grant(user, media, admin);

    let client_html = fetch_page(addr, &h.session(user), media)
        .await
        .text()
        .await
        .unwrap();
    assert!(client_html.contains("data:image/svg+xml"));

    let admin_html = fetch_page(addr, &h.session(admin), media)
        .await
        .text()
        .await
        .unwrap();
    assert!(!admin_html.contains("data:image/svg+xml"));
}

#[tokio::test]
async fn ungranted_client_gets_403() {
    let (h, addr) = TestHarness::with_server().await;
    let user = h.create_user("casey", "pw", Role::Client);
    let media = h.add_video("Clip");

    let resp = fetch_page(addr, &h.session(user), media).await;
    assert_eq!(resp.status(), 403);
}
