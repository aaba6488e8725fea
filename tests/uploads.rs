//! Upload, media listing and static serving tests.

use reqwest::header::{COOKIE, RETRY_AFTER};
use reqwest::multipart::{Form, Part};
use serde_json::Value;

mod common;
use common::start_server;

const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nnot-really-an-image";

fn form(name: &str, mime: &str, bytes: &[u8]) -> Form {
    let part = Part::bytes(bytes.to_vec())
        .file_name(name.to_string())
        .mime_str(mime)
        .unwrap();
    Form::new().part("file", part)
}

#[tokio::test]
async fn test_upload_throttle_allows_ten_per_hour() {
    let server = start_server(|config| config.uploads.require_session = false).await;
    let ip = "203.0.113.7";

    for i in 0..10 {
        let res = server
            .client
            .post(server.url("/api/upload"))
            .header("x-forwarded-for", ip)
            .multipart(form(&format!("logo {i}.png"), "image/png", PNG_BYTES))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 200, "upload {i} should be accepted");
    }

    let res = server
        .client
        .post(server.url("/api/upload"))
        .header("x-forwarded-for", ip)
        .multipart(form("one-too-many.png", "image/png", PNG_BYTES))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 429);

    let retry_after: u64 = res.headers()[RETRY_AFTER].to_str().unwrap().parse().unwrap();
    assert!(
        (3590..=3600).contains(&retry_after),
        "Retry-After was {retry_after}"
    );
    assert_eq!(res.headers()["x-ratelimit-limit"], "10");
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Too many uploads. Please try again later.");

    // The budget is per client.
    let res = server
        .client
        .post(server.url("/api/upload"))
        .header("x-forwarded-for", "203.0.113.8")
        .multipart(form("other.png", "image/png", PNG_BYTES))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
}

#[tokio::test]
async fn test_uploaded_file_is_listed_and_served() {
    let server = start_server(|config| config.uploads.require_session = false).await;

    let res = server
        .client
        .post(server.url("/api/upload"))
        .multipart(form("my logo.png", "image/png", PNG_BYTES))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], true);
    let file = &body["file"];
    assert_eq!(file["name"], "my logo.png");
    assert_eq!(file["type"], "image/png");
    assert_eq!(file["size"], PNG_BYTES.len());
    let url = file["url"].as_str().unwrap().to_string();
    assert!(url.starts_with("/uploads/"));
    assert!(url.ends_with("-my_logo.png"), "unexpected url {url}");

    let served = server.client.get(server.url(&url)).send().await.unwrap();
    assert_eq!(served.status(), 200);
    assert_eq!(served.bytes().await.unwrap().as_ref(), PNG_BYTES);

    let listing: Value = server
        .client
        .get(server.url("/api/media"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listing["success"], true);
    let files = listing["files"].as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["url"], url.as_str());
    assert!(files[0]["uploadedAt"].is_string());
}

#[tokio::test]
async fn test_video_upload_goes_to_videos_dir() {
    let server = start_server(|config| config.uploads.require_session = false).await;

    let res = server
        .client
        .post(server.url("/api/upload-video"))
        .multipart(form("clip.mp4", "video/mp4", b"fake mp4 data"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert!(body["file"]["url"]
        .as_str()
        .unwrap()
        .starts_with("/uploads/videos/"));
    assert_eq!(std::fs::read_dir(server.uploads_dir().join("videos")).unwrap().count(), 1);

    // Videos live in a subdirectory and are not part of the media listing.
    let listing: Value = server
        .client
        .get(server.url("/api/media"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(listing["files"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_upload_rejects_bad_input() {
    let server = start_server(|config| config.uploads.require_session = false).await;

    let res = server
        .client
        .post(server.url("/api/upload"))
        .multipart(form("notes.txt", "text/plain", b"hello"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "File type not allowed: text/plain");

    let res = server
        .client
        .post(server.url("/api/upload-video"))
        .multipart(form("logo.png", "image/png", PNG_BYTES))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "File must be a video");

    let res = server
        .client
        .post(server.url("/api/upload"))
        .multipart(Form::new().text("caption", "no file here"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "No file uploaded");
}

#[tokio::test]
async fn test_upload_size_limit() {
    let server = start_server(|config| {
        config.uploads.require_session = false;
        config.uploads.max_file_bytes = 1024;
    })
    .await;

    let res = server
        .client
        .post(server.url("/api/upload"))
        .multipart(form("big.png", "image/png", &vec![0u8; 4096]))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 413);

    // The refused body is not left behind on disk.
    let leftovers = std::fs::read_dir(server.uploads_dir())
        .map(|dir| dir.count())
        .unwrap_or(0);
    assert_eq!(leftovers, 0);
}

#[tokio::test]
async fn test_upload_requires_session_by_default() {
    let server = start_server(|_| {}).await;

    let res = server
        .client
        .post(server.url("/api/upload"))
        .multipart(form("logo.png", "image/png", PNG_BYTES))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 401);

    let cookie = server.login("192.0.2.99").await;
    let res = server
        .client
        .post(server.url("/api/upload"))
        .header(COOKIE, cookie)
        .multipart(form("logo.png", "image/png", PNG_BYTES))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
}
