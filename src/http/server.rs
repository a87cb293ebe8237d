//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with all handlers
//! - Wire up middleware (tracing, request ID, limits, timeout, no-store)
//! - Serve plain TCP or TLS with graceful shutdown

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, HeaderValue};
use axum::routing::{get, post};
use axum::{middleware, Router};
use tokio::net::TcpListener;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::audit::AuditStore;
use crate::auth::{AuthGuard, TokenSessions};
use crate::clock::Clock;
use crate::config::VaultConfig;
use crate::http::{auth, handlers, request};
use crate::lifecycle::Shutdown;
use crate::net::tls::load_tls_config;
use crate::notes::{MemoryNoteStore, SessionNoteService};

pub type NoteService = SessionNoteService<MemoryNoteStore, AuditStore>;
pub type Guard = AuthGuard<TokenSessions, AuditStore>;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub notes: Arc<NoteService>,
    pub guard: Arc<Guard>,
    pub clock: Arc<dyn Clock>,
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(state: AppState, config: &VaultConfig) -> Router {
    let notes = Router::new()
        .route("/notes", post(handlers::create_note).get(handlers::list_notes))
        .route(
            "/notes/{id}",
            get(handlers::read_note).put(handlers::update_note),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    Router::new()
        .route("/health", get(handlers::health))
        .merge(notes)
        .with_state(state)
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.timeouts.request_secs,
        )))
        .layer(TraceLayer::new_for_http().make_span_with(request::make_span))
        .layer(PropagateRequestIdLayer::new(request::X_REQUEST_ID))
        .layer(SetRequestIdLayer::new(request::X_REQUEST_ID, MakeRequestUuid))
}

/// HTTP server for the session vault.
pub struct HttpServer {
    router: Router,
    config: VaultConfig,
}

impl HttpServer {
    pub fn new(state: AppState, config: VaultConfig) -> Self {
        let router = build_router(state, &config);
        Self { router, config }
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown.wait())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Serve TLS on the configured bind address until `shutdown` fires.
    pub async fn run_tls(self, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let tls = self.config.listener.tls.as_ref().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "TLS is not configured")
        })?;
        let rustls = load_tls_config(Path::new(&tls.cert_path), Path::new(&tls.key_path)).await?;
        let addr: SocketAddr = self
            .config
            .listener
            .bind_address
            .parse()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

        let handle = axum_server::Handle::new();
        let grace = Duration::from_secs(self.config.timeouts.shutdown_grace_secs);
        let drain = handle.clone();
        let wait = shutdown.wait();
        tokio::spawn(async move {
            wait.await;
            drain.graceful_shutdown(Some(grace));
        });

        tracing::info!(address = %addr, "HTTPS server starting");
        axum_server::bind_rustls(addr, rustls)
            .handle(handle)
            .serve(
                self.router
                    .into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }
}
