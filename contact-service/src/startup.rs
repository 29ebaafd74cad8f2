//! Application startup and lifecycle management.

use crate::config::{ContactConfig, CorsPolicy, EnvSource, ProcessEnv};
use crate::handlers::{health_check, metrics_endpoint, submit_contact};
use crate::services::{EmailProvider, MailgunProvider, Notifier, SmtpProvider};
use axum::{
    http::{header, HeaderName, Method},
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics_middleware, request_id_middleware, security_headers_middleware, RequestId,
    REQUEST_ID_HEADER,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ContactConfig>,
    pub notifier: Arc<Notifier>,
}

impl AppState {
    pub fn new(config: ContactConfig, notifier: Notifier) -> Self {
        Self {
            config: Arc::new(config),
            notifier: Arc::new(notifier),
        }
    }
}

/// SMTP primary with Mailgun fallback, both reading `env` on every send.
pub fn notifier_from_env(env: Arc<dyn EnvSource>) -> Result<Notifier, AppError> {
    let primary = SmtpProvider::new(env.clone());
    let fallback = MailgunProvider::new(env)
        .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?;

    if primary.is_configured() {
        tracing::info!("SMTP email provider configured");
    } else {
        tracing::warn!("SMTP email provider not configured; submissions rely on the fallback");
    }
    if fallback.is_configured() {
        tracing::info!("Mailgun fallback provider configured");
    } else {
        tracing::info!("Mailgun fallback provider not configured");
    }

    Ok(Notifier::new(Arc::new(primary), Arc::new(fallback)))
}

fn cors_layer(policy: &CorsPolicy) -> CorsLayer {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, request_id.clone()])
        .expose_headers([request_id]);

    match policy {
        CorsPolicy::Any => layer.allow_origin(AllowOrigin::any()),
        // Credentials are only permitted alongside an explicit origin list.
        CorsPolicy::Origins(origins) => layer
            .allow_origin(AllowOrigin::list(origins.iter().cloned()))
            .allow_credentials(true),
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors);

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_endpoint))
        .route("/contact", post(submit_contact))
        .route("/contact/email", post(submit_contact))
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .extensions()
                    .get::<RequestId>()
                    .map(|id| id.0.as_str())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors)
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with providers read from the process
    /// environment.
    pub async fn build(config: ContactConfig) -> Result<Self, AppError> {
        let notifier = notifier_from_env(Arc::new(ProcessEnv))?;
        Self::build_with_notifier(config, notifier).await
    }

    /// Build the application around an existing notifier (port 0 = random
    /// port for testing).
    pub async fn build_with_notifier(
        config: ContactConfig,
        notifier: Notifier,
    ) -> Result<Self, AppError> {
        let addr = config.common.socket_addr();
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(
            port,
            recipient = %config.recipient,
            primary = notifier.primary_name(),
            fallback = notifier.fallback_name(),
            "Contact service listening"
        );

        Ok(Self {
            port,
            listener,
            state: AppState::new(config, notifier),
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the application until a shutdown signal arrives.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = build_router(self.state);

        axum::serve(self.listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| {
                tracing::error!("HTTP server error: {}", e);
                e
            })
    }
}
