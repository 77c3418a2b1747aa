//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all endpoints
//! - Wire up middleware (tracing, limits, request ID)
//! - Apply configuration reloads to the live config
//! - Serve until the shutdown signal fires

use std::sync::Arc;

use axum::{body::Body, extract::Request, routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::audit::AuditSink;
use crate::config::{shared, GateConfig, SharedConfig};
use crate::domain::{AclRefresh, CardHolders, GroupRules, System};
use crate::http::handler::RequestHandler;
use crate::http::request::{propagate_request_id_layer, request_span, set_request_id_layer};
use crate::http::routes::{self, AppState};
use crate::security::limits::{body_limit_layer, extractor_limit};
use crate::security::CardPolicy;

/// Domain collaborators the endpoints delegate to.
pub struct Services {
    pub cardholders: Arc<CardHolders>,
    pub system: Arc<System>,
    pub refresh: AclRefresh,
}

impl Services {
    /// Default collaborators: card-number policy and config-driven group rules.
    pub fn from_config(config: &SharedConfig, audit: AuditSink) -> Self {
        let policy = Arc::new(CardPolicy::new(config.clone()));
        let cardholders = Arc::new(CardHolders::new(policy, audit.clone()));
        Self::with_cardholders(config, cardholders, audit)
    }

    /// Build the remaining collaborators around an existing card holder store.
    pub fn with_cardholders(config: &SharedConfig, cardholders: Arc<CardHolders>, audit: AuditSink) -> Self {
        let rules = Arc::new(GroupRules::new(config.clone()));
        Self {
            system: Arc::new(System::new(cardholders.clone(), audit)),
            refresh: AclRefresh::new(cardholders.clone(), rules),
            cardholders,
        }
    }
}

/// HTTP server for the access gate.
pub struct HttpServer {
    router: Router,
    config: SharedConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the default collaborators.
    pub fn new(config: GateConfig, audit: AuditSink) -> Self {
        let config = shared(config);
        let services = Services::from_config(&config, audit);
        Self::with_services(config, services)
    }

    /// Create a new HTTP server around the given collaborators.
    pub fn with_services(config: SharedConfig, services: Services) -> Self {
        let handler = RequestHandler::new(config.clone()).with_hook(services.refresh);
        let state = AppState {
            handler,
            cardholders: services.cardholders,
            system: services.system,
        };

        let router = Self::build_router(&config.load(), state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GateConfig, state: AppState) -> Router {
        Router::new()
            .route(
                "/cardholders",
                get(routes::list_cardholders)
                    .post(routes::add_cardholder)
                    .patch(routes::update_cardholder),
            )
            .route("/system", get(routes::get_system).post(routes::update_system))
            .route("/healthz", get(routes::healthz))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(set_request_id_layer())
                    .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                        request_span(request)
                    }))
                    .layer(propagate_request_id_layer())
                    .layer(body_limit_layer(&config.security))
                    .layer(extractor_limit(&config.security)),
            )
    }

    /// The fully layered router, e.g. for driving with `tower::ServiceExt::oneshot`.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Configs received on `config_updates` replace the live config. Serving
    /// stops gracefully once `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<GateConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let live = self.config.clone();
        let reloader = tokio::spawn(async move {
            while let Some(next) = config_updates.recv().await {
                tracing::info!(
                    operation_ms = next.timeouts.operation_ms,
                    min_gzip_bytes = next.compression.min_gzip_bytes,
                    "Applying reloaded configuration"
                );
                live.store(Arc::new(next));
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        reloader.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{AuditTrail, MemoryWriter};
    use crate::error::{MSG_FORBIDDEN, MSG_INVALID_REQUEST, MSG_PAYLOAD_TOO_LARGE};
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use tower::ServiceExt;

    fn server() -> (HttpServer, AuditTrail, MemoryWriter) {
        let writer = MemoryWriter::new();
        let trail = AuditTrail::new(16, writer.clone());
        let server = HttpServer::new(GateConfig::default(), trail.sink());
        (server, trail, writer)
    }

    fn post(uri: &str, body: &'static str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    async fn text(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_router_adds_cardholder() {
        let (server, mut trail, writer) = server();
        trail.start();

        let response = server
            .router()
            .oneshot(post("/cardholders", r#"{"card":6000001,"name":"Ada"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(
            text(response).await,
            r#"{"db":{"cardholders":[{"card":6000001,"name":"Ada","groups":[]}]}}"#
        );

        trail.stop().await;
        assert_eq!(writer.entries().len(), 1);
    }

    #[tokio::test]
    async fn test_router_classifies_failures() {
        let (server, _trail, _) = server();

        let response = server
            .router()
            .oneshot(post("/cardholders", r#"{"card":100}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(text(response).await, MSG_FORBIDDEN);

        let response = server
            .router()
            .oneshot(post("/system", r#"{"colour":"red"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(text(response).await, MSG_INVALID_REQUEST);
    }

    #[tokio::test]
    async fn test_chunked_body_over_limit_is_payload_too_large() {
        let mut config = GateConfig::default();
        config.security.max_body_size = 16;
        let trail = AuditTrail::new(4, MemoryWriter::new());
        let server = HttpServer::new(config, trail.sink());

        let chunks = vec![
            Ok::<_, std::io::Error>(axum::body::Bytes::from_static(br#"{"card":6000001,"#)),
            Ok(axum::body::Bytes::from_static(br#""name":"a rather long name"}"#)),
        ];
        let request = Request::builder()
            .method(Method::POST)
            .uri("/cardholders")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from_stream(futures_util::stream::iter(chunks)))
            .unwrap();

        let response = server.router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(text(response).await, MSG_PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let mut config = GateConfig::default();
        config.security.max_body_size = 16;
        let trail = AuditTrail::new(4, MemoryWriter::new());
        let server = HttpServer::new(config, trail.sink());

        let response = server
            .router()
            .oneshot(post("/cardholders", r#"{"card":6000001,"name":"a long name"}"#))
            .await
            .unwrap();
        assert!(response.status().is_client_error());
    }
}
