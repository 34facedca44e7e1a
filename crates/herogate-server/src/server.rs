use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{Router, middleware, routing::get};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use url::Url;

use herogate_upstream::UpstreamClient;

use crate::auth::{AuthGate, authentication_middleware};
use crate::cache::{TtlCache, spawn_expiry_sweeper};
use crate::config::AppConfig;
use crate::handlers;
use crate::middleware as app_middleware;
use crate::service::{CachedView, HeroService};

/// Shared per-process state handed to handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<HeroService>,
    pub gate: Arc<AuthGate>,
    pub cache: Arc<TtlCache<CachedView>>,
}

impl AppState {
    pub fn from_config(cfg: &AppConfig) -> anyhow::Result<Self> {
        let base_url =
            Url::parse(&cfg.upstream.base_url).context("upstream.base_url is not a valid URL")?;
        let upstream = Arc::new(UpstreamClient::new(&base_url, cfg.upstream.timeout()));
        let cache = Arc::new(TtlCache::new(cfg.cache.ttl()));
        let retry = cfg.retry.policy();

        let service = Arc::new(HeroService::new(
            Arc::clone(&upstream),
            Arc::clone(&cache),
            retry,
        ));
        let gate = Arc::new(AuthGate::new(upstream, retry));

        Ok(Self {
            service,
            gate,
            cache,
        })
    }
}

pub fn build_app(cfg: &AppConfig) -> anyhow::Result<Router> {
    let state = AppState::from_config(cfg)?;
    Ok(router(state))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        // Health and info endpoints
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .route("/readyz", get(handlers::readyz))
        // Heroes resource
        .route("/heroes", get(handlers::list_heroes))
        .route("/heroes/{hero_id}", get(handlers::get_hero))
        // Middleware stack (order: auth gate -> request id -> cors/compression/trace)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            authentication_middleware,
        ))
        .layer(middleware::from_fn(app_middleware::request_id))
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let req_id = req
                        .headers()
                        .get("x-request-id")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri(),
                        request_id = %req_id
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        tracing::info!(
                            http.status = %res.status().as_u16(),
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        )
        .with_state(state)
}

pub struct HerogateServer {
    addr: SocketAddr,
    app: Router,
    cache: Arc<TtlCache<CachedView>>,
    sweep_interval: Duration,
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
        }
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    pub fn build(self) -> anyhow::Result<HerogateServer> {
        let state = AppState::from_config(&self.config)?;
        let cache = Arc::clone(&state.cache);
        let app = router(state);

        Ok(HerogateServer {
            addr: self.addr,
            app,
            cache,
            sweep_interval: self.config.cache.sweep_interval(),
        })
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HerogateServer {
    pub async fn run(self) -> anyhow::Result<()> {
        let sweeper = spawn_expiry_sweeper(self.cache, self.sweep_interval);

        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        sweeper.abort();
        Ok(())
    }
}

async fn shutdown_signal() {
    // Wait for Ctrl+C
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
