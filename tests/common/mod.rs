//! Shared utilities for integration tests.

use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;

use reqwest::header::SET_COOKIE;
use serde_json::json;
use tempfile::TempDir;
use tokio::net::TcpListener;

use studio_server::config::StudioConfig;
use studio_server::{Shutdown, StudioServer};

pub const ADMIN_USERNAME: &str = "studio_admin";
pub const ADMIN_PASSWORD: &str = "correct-horse-battery";

/// A server on an ephemeral port, serving a throwaway site directory.
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: reqwest::Client,
    pub dir: TempDir,
    shutdown: Shutdown,
}

#[allow(dead_code)]
impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.dir.path().join("public").join("uploads")
    }

    /// Log in as `client_ip` and return the `Cookie` header value.
    pub async fn login(&self, client_ip: &str) -> String {
        let res = self
            .client
            .post(self.url("/api/auth/login"))
            .header("x-forwarded-for", client_ip)
            .json(&json!({ "username": ADMIN_USERNAME, "password": ADMIN_PASSWORD }))
            .send()
            .await
            .expect("login request failed");
        assert_eq!(res.status(), 200, "login should succeed");
        session_cookie(&res).expect("login did not set a session cookie")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// `admin_session=...` pair from a response's `Set-Cookie` headers.
#[allow(dead_code)]
pub fn session_cookie(res: &reqwest::Response) -> Option<String> {
    res.headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("admin_session="))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

/// Start a server with test credentials, trusted forwarding headers and a
/// temporary site; `configure` can adjust anything else.
pub async fn start_server<F>(configure: F) -> TestServer
where
    F: FnOnce(&mut StudioConfig),
{
    let dir = tempfile::tempdir().unwrap();
    let public = dir.path().join("public");
    fs::create_dir_all(public.join("admin").join("login")).unwrap();
    fs::write(public.join("index.html"), "<h1>studio</h1>").unwrap();
    fs::write(public.join("admin").join("index.html"), "<h1>dashboard</h1>").unwrap();
    fs::write(
        public.join("admin").join("login").join("index.html"),
        "<h1>login</h1>",
    )
    .unwrap();

    let mut config = StudioConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.listener.trust_forwarded_for = true;
    config.site.public_dir = public.to_string_lossy().into_owned();
    config.uploads.dir = public.join("uploads").to_string_lossy().into_owned();
    config.auth.username = ADMIN_USERNAME.into();
    config.auth.password = ADMIN_PASSWORD.into();
    configure(&mut config);

    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = StudioServer::new(config);
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .unwrap();

    TestServer {
        addr,
        client,
        dir,
        shutdown,
    }
}
