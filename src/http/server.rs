//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (CORS, tracing, body limit, request ID)
//! - Bind server to listener
//! - Stop accepting connections when shutdown is signalled

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::checker::Checker;
use crate::config::AppConfig;
use crate::http::handlers;
use crate::http::request::{request_span, UuidRequestId};
use crate::resilience::{pacer_from_config, Pacer};
use crate::session::{MediaLoader, Session};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub session: Session,
    pub checker: Arc<Checker>,
    pub media: Arc<dyn MediaLoader>,
    pub max_numbers: usize,
}

/// HTTP server for the checker API.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: AppConfig, session: Session, media: Arc<dyn MediaLoader>) -> Self {
        let pacer = pacer_from_config(&config.batch);
        Self::with_pacer(config, session, media, pacer)
    }

    /// Like [`HttpServer::new`] with an explicit batch pacer.
    pub fn with_pacer(
        config: AppConfig,
        session: Session,
        media: Arc<dyn MediaLoader>,
        pacer: Arc<dyn Pacer>,
    ) -> Self {
        let checker = Arc::new(Checker::new(
            session.client().clone(),
            pacer,
            config.batch.min_digits,
        ));

        let state = AppState {
            session,
            checker,
            media,
            max_numbers: config.batch.max_numbers,
        };

        Self {
            router: Self::build_router(&config, state),
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &AppConfig, state: AppState) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .route("/health", get(handlers::health))
            .route("/status", get(handlers::status))
            .route("/check-number", post(handlers::check_number))
            .route("/check-numbers", post(handlers::check_numbers))
            .route("/send-image", post(handlers::send_image))
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.listener.max_body_bytes))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(request_span))
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
            .layer(cors)
    }

    /// The router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::debug!("HTTP server no longer accepting connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
