//! Application startup and lifecycle management.

use crate::config::{ContactConfig, CorsConfig};
use crate::handlers;
use crate::services::{CollectionTarget, DocumentStore, MongoStore, SubmissionService};
use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn,
    routing::{any, get},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics_middleware, request_id_middleware, security_headers_middleware, REQUEST_ID_HEADER,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// Largest submission body accepted.
pub const SUBMIT_BODY_LIMIT: usize = 64 * 1024;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ContactConfig,
    pub submissions: SubmissionService,
}

/// Build the full HTTP router for the given state.
pub fn router(state: AppState) -> Result<Router, AppError> {
    let mut router = Router::new()
        .route("/", any(handlers::submit))
        .route("/api/submit", any(handlers::submit))
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .fallback(handlers::not_found)
        .layer(from_fn(metrics_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
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
        .layer(from_fn(request_id_middleware));

    if let Some(cors) = cors_layer(&state.config.cors)? {
        router = router.layer(cors);
    }

    Ok(router.with_state(state))
}

fn cors_layer(config: &CorsConfig) -> Result<Option<CorsLayer>, AppError> {
    if config.allowed_origins.is_empty() {
        return Ok(None);
    }

    let origins = config
        .allowed_origins
        .iter()
        .map(|origin| {
            origin.parse::<HeaderValue>().map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!("Invalid CORS origin '{}': {}", origin, e))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::POST])
            .allow_headers([header::CONTENT_TYPE]),
    ))
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application against MongoDB.
    pub async fn build(config: ContactConfig) -> Result<Self, AppError> {
        let store: Arc<dyn DocumentStore> = Arc::new(MongoStore::new(&config.mongodb));
        Self::build_with_store(config, store).await
    }

    /// Build the application against any document store.
    pub async fn build_with_store(
        config: ContactConfig,
        store: Arc<dyn DocumentStore>,
    ) -> Result<Self, AppError> {
        let target = CollectionTarget::new(&config.mongodb.database, &config.mongodb.collection);
        tracing::info!(namespace = %target, "Submission target configured");

        let state = AppState {
            config: config.clone(),
            submissions: SubmissionService::new(store, target),
        };
        let router = router(state)?;

        // Port 0 picks a random port for testing
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Contact service: HTTP on port {}", port);

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve until Ctrl+C or SIGTERM.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MongoConfig;
    use crate::services::MemoryStore;
    use axum::{body::Body, http::Request, http::StatusCode};
    use http_body_util::BodyExt;
    use secrecy::Secret;
    use tower::ServiceExt;

    fn config(allowed_origins: Vec<String>) -> ContactConfig {
        ContactConfig {
            common: service_core::config::Config::default(),
            mongodb: MongoConfig {
                uri: Secret::new("mongodb://localhost:27017".to_string()),
                database: "contact_db".to_string(),
                collection: "messages".to_string(),
                server_selection_timeout_ms: 250,
            },
            cors: CorsConfig { allowed_origins },
            otlp_endpoint: None,
        }
    }

    fn app(store: &MemoryStore) -> Router {
        let config = config(vec![]);
        let target = CollectionTarget::new(&config.mongodb.database, &config.mongodb.collection);
        router(AppState {
            config,
            submissions: SubmissionService::new(Arc::new(store.clone()), target),
        })
        .unwrap()
    }

    async fn json_body(res: axum::response::Response) -> serde_json::Value {
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn get_root_is_method_not_allowed() {
        let store = MemoryStore::new();
        let res = app(&store)
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(res.headers().get(header::ALLOW).unwrap(), "POST");
        let body = json_body(res).await;
        assert_eq!(body["success"], false);
        assert_eq!(store.connects(), 0);
    }

    #[tokio::test]
    async fn method_gate_runs_before_body_parsing() {
        let store = MemoryStore::new();
        let res = app(&store)
            .oneshot(
                Request::builder()
                    .method(Method::PUT)
                    .uri("/api/submit")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("not json"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn post_valid_submission_stores_it() {
        let store = MemoryStore::new();
        let res = app(&store)
            .oneshot(post_json(
                "/api/submit",
                r#"{"name":"Alice","email":"a@x.com","message":"hi"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().contains_key(REQUEST_ID_HEADER));
        let body = json_body(res).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], crate::dtos::SUBMITTED_MESSAGE);
        assert_eq!(store.total_documents(), 1);
        assert_eq!(store.open_connections(), 0);
    }

    #[tokio::test]
    async fn post_empty_object_is_bad_request() {
        let store = MemoryStore::new();
        let res = app(&store).oneshot(post_json("/", "{}")).await.unwrap();

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(res).await["success"], false);
        assert_eq!(store.connects(), 0);
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let store = MemoryStore::new();
        let message = "x".repeat(SUBMIT_BODY_LIMIT + 1);
        let body = format!(r#"{{"name":"A","email":"a@x.com","message":"{}"}}"#, message);

        let res = app(&store)
            .oneshot(post_json("/api/submit", &body))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(json_body(res).await["success"], false);
        assert_eq!(store.connects(), 0);
    }

    #[tokio::test]
    async fn oversized_non_post_is_method_not_allowed() {
        let store = MemoryStore::new();
        let res = app(&store)
            .oneshot(
                Request::builder()
                    .method(Method::GET)
                    .uri("/")
                    .body(Body::from("x".repeat(SUBMIT_BODY_LIMIT + 1)))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(res.headers().get(header::ALLOW).unwrap(), "POST");
        assert_eq!(json_body(res).await["success"], false);
    }

    #[tokio::test]
    async fn unknown_route_is_structured_not_found() {
        let store = MemoryStore::new();
        let res = app(&store)
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let body = json_body(res).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], service_core::error::NOT_FOUND_MESSAGE);
    }

    #[tokio::test]
    async fn cors_preflight_allows_configured_origin() {
        let store = MemoryStore::new();
        let config = config(vec!["https://example.com".to_string()]);
        let target = CollectionTarget::new(&config.mongodb.database, &config.mongodb.collection);
        let app = router(AppState {
            config,
            submissions: SubmissionService::new(Arc::new(store), target),
        })
        .unwrap();

        let res = app
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/api/submit")
                    .header(header::ORIGIN, "https://example.com")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            res.headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "https://example.com"
        );
    }

    #[test]
    fn invalid_cors_origin_is_config_error() {
        let err = cors_layer(&CorsConfig {
            allowed_origins: vec!["bad\norigin".to_string()],
        })
        .unwrap_err();

        assert!(matches!(err, AppError::ConfigError(_)));
    }
}
