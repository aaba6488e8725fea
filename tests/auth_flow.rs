//! Login, lockout and session tests against a running server.

use reqwest::header::{COOKIE, RETRY_AFTER};
use serde_json::{json, Value};

mod common;
use common::{session_cookie, start_server, ADMIN_PASSWORD, ADMIN_USERNAME};

async fn attempt(server: &common::TestServer, ip: &str, password: &str) -> reqwest::Response {
    server
        .client
        .post(server.url("/api/auth/login"))
        .header("x-forwarded-for", ip)
        .json(&json!({ "username": ADMIN_USERNAME, "password": password }))
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_login_sets_session_cookie() {
    let server = start_server(|_| {}).await;

    let res = attempt(&server, "192.0.2.10", ADMIN_PASSWORD).await;
    assert_eq!(res.status(), 200);

    let raw = res
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("admin_session="))
        .unwrap()
        .to_string();
    assert!(raw.contains("HttpOnly"));
    assert!(raw.contains("SameSite=Strict"));
    assert!(raw.contains("Path=/"));
    assert!(raw.contains("Max-Age=86400"));

    let cookie = session_cookie(&res).unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "success": true }));

    let session: Value = server
        .client
        .get(server.url("/api/auth/session"))
        .header(COOKIE, &cookie)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(session["authenticated"], true);
    assert_eq!(session["username"], ADMIN_USERNAME);

    let res = server
        .client
        .post(server.url("/api/auth/logout"))
        .header(COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let session: Value = server
        .client
        .get(server.url("/api/auth/session"))
        .header(COOKIE, &cookie)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(session["authenticated"], false);
}

#[tokio::test]
async fn test_lockout_after_five_failures() {
    let server = start_server(|_| {}).await;
    let ip = "198.51.100.7";

    for expected_remaining in (0..5).rev() {
        let res = attempt(&server, ip, "wrong-password").await;
        assert_eq!(res.status(), 401);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Invalid credentials");
        assert_eq!(body["remainingAttempts"], expected_remaining);
    }

    // Locked: even the right password is refused.
    let res = attempt(&server, ip, ADMIN_PASSWORD).await;
    assert_eq!(res.status(), 429);
    let retry_after: u64 = res.headers()[RETRY_AFTER].to_str().unwrap().parse().unwrap();
    assert!((890..=900).contains(&retry_after), "Retry-After was {retry_after}");
    let body: Value = res.json().await.unwrap();
    assert_eq!(
        body["error"],
        "Account temporarily locked. Try again in 15 minutes."
    );

    // Other clients are unaffected.
    let res = attempt(&server, "198.51.100.8", ADMIN_PASSWORD).await;
    assert_eq!(res.status(), 200);
}

#[tokio::test]
async fn test_success_clears_failures() {
    let server = start_server(|_| {}).await;
    let ip = "203.0.113.20";

    for _ in 0..3 {
        assert_eq!(attempt(&server, ip, "wrong-password").await.status(), 401);
    }
    assert_eq!(attempt(&server, ip, ADMIN_PASSWORD).await.status(), 200);
}

#[tokio::test]
async fn test_login_throttle_without_lockout() {
    let server = start_server(|config| config.lockout.enabled = false).await;
    let ip = "203.0.113.30";

    for _ in 0..5 {
        assert_eq!(attempt(&server, ip, "wrong-password").await.status(), 401);
    }

    let res = attempt(&server, ip, ADMIN_PASSWORD).await;
    assert_eq!(res.status(), 429);
    assert_eq!(res.headers()["x-ratelimit-limit"], "5");
    assert_eq!(res.headers()["x-ratelimit-remaining"], "0");
    assert!(res.headers().contains_key("x-ratelimit-reset"));
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Too many login attempts. Please try again later.");
}

#[tokio::test]
async fn test_login_validation_errors() {
    let server = start_server(|_| {}).await;

    let res = server
        .client
        .post(server.url("/api/auth/login"))
        .json(&json!({ "username": "a!", "password": "short" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Invalid input data");
    let details: Vec<String> = serde_json::from_value(body["details"].clone()).unwrap();
    assert!(details.contains(&"username: Username must be at least 3 characters".to_string()));
    assert!(details.contains(&"password: Password must be at least 8 characters".to_string()));

    let res = server
        .client
        .post(server.url("/api/auth/login"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Invalid input data");
}

#[tokio::test]
async fn test_password_only_login_when_allowed() {
    let server = start_server(|config| config.auth.allow_password_only = true).await;

    let res = server
        .client
        .post(server.url("/api/auth/login"))
        .json(&json!({ "password": ADMIN_PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert!(session_cookie(&res).is_some());
}

#[tokio::test]
async fn test_security_report_requires_session() {
    let server = start_server(|_| {}).await;

    let res = server
        .client
        .get(server.url("/api/admin/security"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 401);

    assert_eq!(attempt(&server, "192.0.2.50", "wrong-password").await.status(), 401);
    let cookie = server.login("192.0.2.51").await;

    let res = server
        .client
        .get(server.url("/api/admin/security"))
        .header(COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let report: Value = res.json().await.unwrap();
    assert_eq!(report["metrics"]["totalLogins"], 1);
    assert_eq!(report["metrics"]["failedLogins"], 1);
    assert!(report["anomalies"].as_array().unwrap().is_empty());

    let kinds: Vec<&str> = report["recentEvents"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|e| e["event"].as_str())
        .collect();
    assert!(kinds.contains(&"LOGIN_SUCCESS"));
    assert!(kinds.contains(&"LOGIN_FAILED"));
    assert!(kinds.contains(&"UNAUTHORIZED_ACCESS"));
}
