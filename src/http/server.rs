//! HTTP server setup.
//!
//! # Responsibilities
//! - Build the shared `AppState` from configuration
//! - Create the Axum router: API routes, admin API, static site
//! - Wire up middleware (request ID, tracing, timeout, security headers)
//! - Serve until a signal or the shutdown handle fires
//! - Periodically drop expired sessions and stale lockout entries

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{services::ServeDir, timeout::TimeoutLayer, trace::TraceLayer};

use crate::admin;
use crate::admin::auth::admin_page_guard;
use crate::auth::{AdminCredentials, SessionStore};
use crate::config::StudioConfig;
use crate::http::handlers::{auth, health, media, upload};
use crate::http::middleware::api_throttle_middleware;
use crate::http::request;
use crate::lifecycle::signals::shutdown_signal;
use crate::lifecycle::{Shutdown, ShutdownListener};
use crate::media::MediaStore;
use crate::observability::{metrics, SecurityMonitor};
use crate::security::{headers, LockoutPolicy, LockoutTracker, RequestThrottle};

/// Room for multipart boundaries and part headers on top of the file limit.
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

const MAINTENANCE_INTERVAL: Duration = Duration::from_secs(60);

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<StudioConfig>,
    pub throttle: RequestThrottle,
    pub lockout: Arc<LockoutTracker>,
    pub sessions: Arc<SessionStore>,
    pub credentials: Arc<AdminCredentials>,
    pub media: Arc<MediaStore>,
    pub monitor: Arc<SecurityMonitor>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: StudioConfig) -> Self {
        Self {
            throttle: RequestThrottle::default(),
            lockout: Arc::new(LockoutTracker::new(LockoutPolicy::from(&config.lockout))),
            sessions: Arc::new(SessionStore::new(config.session.ttl())),
            credentials: Arc::new(AdminCredentials::from_config(&config.auth)),
            media: Arc::new(MediaStore::from_config(&config.uploads)),
            monitor: Arc::new(SecurityMonitor::new(
                config.observability.security_log_capacity,
            )),
            started_at: Instant::now(),
            config: Arc::new(config),
        }
    }
}

/// The studio HTTP server.
pub struct StudioServer {
    router: Router,
    state: AppState,
}

impl StudioServer {
    pub fn new(config: StudioConfig) -> Self {
        let state = AppState::new(config);
        let router = build_router(state.clone());
        Self { router, state }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until SIGINT/SIGTERM or `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let background = Shutdown::new();
        let maintenance = tokio::spawn(run_maintenance(self.state.clone(), background.listener()));

        let mut shutdown = ShutdownListener::from(shutdown);
        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = shutdown_signal() => {}
                    _ = shutdown.triggered() => {
                        tracing::info!("Shutdown requested");
                    }
                }
            })
            .await;

        background.trigger();
        if let Err(e) = maintenance.await {
            tracing::warn!(error = %e, "Maintenance task failed");
        }
        tracing::info!("HTTP server stopped");
        result
    }
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(state: AppState) -> Router {
    let config = Arc::clone(&state.config);
    let uploads = &config.uploads;

    // Login and uploads count against their own budgets inside the handler.
    let login_routes = Router::new().route("/api/auth/login", post(auth::login));

    let upload_routes = Router::new()
        .route(
            "/api/upload",
            post(upload::upload_file).layer(DefaultBodyLimit::max(
                uploads.max_file_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES),
            )),
        )
        .route(
            "/api/upload-video",
            post(upload::upload_video).layer(DefaultBodyLimit::max(
                uploads.max_video_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES),
            )),
        );

    let api_routes = Router::new()
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/session", get(auth::session))
        .route("/api/media", get(media::list_media))
        .route("/api/youtube-thumbnail", post(media::youtube_thumbnail))
        .merge(admin::router(state.clone()))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            api_throttle_middleware,
        ));

    let static_site =
        ServeDir::new(&config.site.public_dir).append_index_html_on_directories(true);

    let router = Router::new()
        .route("/health", get(health::health))
        .merge(login_routes)
        .merge(upload_routes)
        .merge(api_routes)
        .fallback_service(static_site)
        .layer(middleware::from_fn_with_state(state.clone(), admin_page_guard))
        .with_state(state);

    let router = if config.security.enable_headers {
        headers::apply(router, &config.security.content_security_policy)
    } else {
        router
    };

    router.layer(
        ServiceBuilder::new()
            .layer(request::set_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(request::make_span::<Body>))
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(request::propagate_request_id_layer()),
    )
}

async fn run_maintenance(state: AppState, mut shutdown: ShutdownListener) {
    let mut interval = tokio::time::interval(MAINTENANCE_INTERVAL);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = shutdown.triggered() => break,
        }

        let sessions = state.sessions.purge_expired();
        let lockouts = state.lockout.purge_stale();
        metrics::record_active_sessions(state.sessions.len());

        if sessions > 0 || lockouts > 0 {
            tracing::debug!(
                expired_sessions = sessions,
                stale_lockouts = lockouts,
                "Maintenance sweep"
            );
        }
    }

    tracing::debug!("Maintenance stopped");
}
