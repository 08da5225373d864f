//! HTTP host for the userhub server.
//!
//! Collects module routers and OpenAPI documents, adds the shared endpoints
//! (`/health`, `/openapi.json`) and the middleware stack, and serves the
//! result until cancelled.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use axum::{middleware::from_fn, routing::get, Router};
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};

pub mod config;
pub mod request_id;
pub mod web;

pub use config::ApiIngressConfig;

/// Timeout applied when neither the section nor the host sets one.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Owns the HTTP server configuration and the merged OpenAPI document.
pub struct ApiIngress {
    config: ApiIngressConfig,
    openapi: utoipa::openapi::OpenApi,
}

impl ApiIngress {
    pub fn new(config: ApiIngressConfig) -> Self {
        let openapi = utoipa::openapi::OpenApiBuilder::new()
            .info(
                utoipa::openapi::InfoBuilder::new()
                    .title("Userhub API")
                    .version(env!("CARGO_PKG_VERSION"))
                    .build(),
            )
            .build();
        Self { config, openapi }
    }

    pub fn config(&self) -> &ApiIngressConfig {
        &self.config
    }

    /// Merge a module's OpenAPI paths and components into the served document.
    pub fn register_openapi(&mut self, doc: utoipa::openapi::OpenApi) {
        self.openapi.merge(doc);
    }

    pub fn openapi(&self) -> &utoipa::openapi::OpenApi {
        &self.openapi
    }

    /// Effective per-request timeout; `None` when configured as 0.
    pub fn request_timeout(&self) -> Option<Duration> {
        match self
            .config
            .request_timeout_secs
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS)
        {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Listen address: the configured one, else `fallback`.
    pub fn bind_addr(&self, fallback: &str) -> Result<SocketAddr> {
        let raw = self.config.bind_addr.as_deref().unwrap_or(fallback);
        raw.parse()
            .with_context(|| format!("Invalid bind address '{raw}'"))
    }

    /// Wrap module routes with the shared endpoints and middleware.
    pub fn build_router(&self, routes: Router) -> Result<Router> {
        tracing::debug!("Building router");
        let mut router = routes.route("/health", get(web::health_check));

        if self.config.enable_docs {
            let doc = Arc::new(serde_json::to_value(&self.openapi)?);
            router = router.route(
                "/openapi.json",
                get(move || {
                    let doc = doc.clone();
                    async move { web::openapi_response(&doc) }
                }),
            );
        }

        // Layers are listed innermost first:
        // BodyLimit -> CORS -> Timeout -> Trace -> push_req_id_to_extensions -> PropagateRequestId -> SetRequestId
        router = router.layer(RequestBodyLimitLayer::new(self.config.body_limit_bytes));

        if self.config.cors_enabled {
            router = router.layer(CorsLayer::permissive());
        }

        if let Some(timeout) = self.request_timeout() {
            router = router.layer(TimeoutLayer::new(timeout));
        }
        router = router.layer(request_id::create_trace_layer());
        router = router.layer(from_fn(request_id::push_req_id_to_extensions));

        let x_request_id = request_id::header();
        router = router.layer(PropagateRequestIdLayer::new(x_request_id.clone()));
        router = router.layer(SetRequestIdLayer::new(x_request_id, request_id::MakeReqId));

        Ok(router)
    }

    /// Bind `addr` and serve `router` until `cancel` fires, then drain gracefully.
    pub async fn serve(router: Router, addr: SocketAddr, cancel: CancellationToken) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))?;
        Self::serve_on(listener, router, cancel).await
    }

    /// Serve on an already bound listener.
    pub async fn serve_on(
        listener: tokio::net::TcpListener,
        router: Router,
        cancel: CancellationToken,
    ) -> Result<()> {
        tracing::info!("HTTP server bound on {}", listener.local_addr()?);

        let shutdown = async move {
            cancel.cancelled().await;
            tracing::info!("HTTP server shutting down gracefully (cancellation)");
        };

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| anyhow::anyhow!(e))
    }
}
