//! HTTP server module
//!
//! Owns the accept loop and the request-to-response mapping: route the
//! request, pull the file out of the multipart body, hand it to the upload
//! gateway, serialize the outcome as JSON. One connection per task; the only
//! shared state is the read-only gateway behind an `Arc`.

use crate::config::Config;
use crate::provider::{CloudinaryClient, MediaProvider, ProviderError};
use crate::router::{RequestRouter, RouterError, UploadRoute};
use crate::upload::multipart::{self, MultipartError};
use crate::upload::{MediaKind, UploadGateway, UploadOutcome};
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::header::{ALLOW, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use prometheus::{Encoder, TextEncoder};
use serde_json::json;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::info;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to bind to address: {0}")]
    BindError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Provider setup error: {0}")]
    ProviderError(#[from] ProviderError),

    #[error("Server error: {0}")]
    RuntimeError(String),
}

/// Shared, read-only request handling state
struct AppState {
    gateway: UploadGateway,
    max_upload_bytes: usize,
    metrics_enabled: bool,
}

/// HTTP Server
pub struct Server {
    addr: SocketAddr,
    state: Arc<AppState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    server_handle: Option<tokio::task::JoinHandle<()>>,
}

impl Server {
    /// Create a server with the production provider client
    pub fn new(config: Config) -> Result<Self, ServerError> {
        let provider = Arc::new(CloudinaryClient::from_config(&config.provider)?);
        Self::with_provider(config, provider)
    }

    /// Create a server over an explicit provider (mocks in tests)
    pub fn with_provider(
        config: Config,
        provider: Arc<dyn MediaProvider>,
    ) -> Result<Self, ServerError> {
        let addr: SocketAddr = config
            .server
            .address
            .parse()
            .map_err(|e| ServerError::BindError(format!("{}", e)))?;

        let state = Arc::new(AppState {
            gateway: UploadGateway::new(provider, &config.upload),
            max_upload_bytes: config.server.max_upload_bytes,
            metrics_enabled: config.metrics.enabled,
        });

        Ok(Self {
            addr,
            state,
            shutdown_tx: None,
            server_handle: None,
        })
    }

    /// Start the server in the background.
    ///
    /// Returns the actual bound address (useful when binding port 0 in tests).
    pub async fn start(&mut self) -> Result<SocketAddr, ServerError> {
        let listener = TcpListener::bind(self.addr).await?;
        let addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        self.shutdown_tx = Some(shutdown_tx);

        let state = self.state.clone();
        let handle = tokio::spawn(async move {
            run_server(listener, state, shutdown_rx).await;
        });

        self.server_handle = Some(handle);

        Ok(addr)
    }

    /// Shutdown the server
    pub async fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.server_handle.take() {
            let _ = handle.await;
        }
    }

    /// Run the server until interrupted
    pub async fn run(mut self) -> Result<(), ServerError> {
        let addr = self.start().await?;
        info!("Listening on {}", addr);

        tokio::signal::ctrl_c()
            .await
            .map_err(|e| ServerError::RuntimeError(e.to_string()))?;

        info!("Shutting down server");
        self.shutdown().await;
        Ok(())
    }
}

/// Run the HTTP server loop
async fn run_server(
    listener: TcpListener,
    state: Arc<AppState>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = &mut shutdown_rx => {
                break;
            }
            result = listener.accept() => {
                match result {
                    Ok((stream, _)) => {
                        let io = TokioIo::new(stream);
                        let state = state.clone();
                        tokio::spawn(async move {
                            let service = service_fn(move |req| {
                                handle_request(req, state.clone())
                            });
                            let _ = http1::Builder::new()
                                .serve_connection(io, service)
                                .await;
                        });
                    }
                    Err(_) => continue,
                }
            }
        }
    }
}

/// Handle HTTP requests
async fn handle_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();

    let response = match RequestRouter::route(&method, &path) {
        Ok(UploadRoute::UploadImage) => handle_upload(req, MediaKind::Image, &state).await,
        Ok(UploadRoute::UploadVideo) => handle_upload(req, MediaKind::Video, &state).await,
        Ok(UploadRoute::Health) => health_response(),
        Ok(UploadRoute::Metrics) if state.metrics_enabled => metrics_response(),
        Ok(UploadRoute::Metrics) => not_found_response(),
        Err(RouterError::MethodNotAllowed { allowed, .. }) => method_not_allowed_response(allowed),
        Err(RouterError::NotFound(_)) => not_found_response(),
    };

    Ok(response)
}

/// Handle one upload request: extract the file, delegate, map the outcome
async fn handle_upload(
    req: Request<Incoming>,
    kind: MediaKind,
    state: &AppState,
) -> Response<Full<Bytes>> {
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let body_stream = req.into_body().into_data_stream();

    let request =
        match multipart::extract_file(body_stream, &content_type, state.max_upload_bytes).await {
            Ok(request) => request,
            Err(MultipartError::TooLarge { limit }) => {
                return json_error(
                    StatusCode::PAYLOAD_TOO_LARGE,
                    &format!("Upload exceeds the {} byte limit", limit),
                )
            }
            Err(MultipartError::MissingFile) | Err(MultipartError::MissingBoundary) => {
                return json_error(StatusCode::BAD_REQUEST, kind.missing_file_message())
            }
            Err(e @ MultipartError::Malformed(_)) => {
                return json_error(StatusCode::BAD_REQUEST, &e.to_string())
            }
        };

    match state.gateway.handle(kind, request).await {
        UploadOutcome::Success { message, url } => json_response(
            StatusCode::OK,
            &json!({ "message": message, "url": url }),
        ),
        UploadOutcome::Failure { status, message } => json_error(
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            &message,
        ),
    }
}

/// Handle /health endpoint
fn health_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(r#"{"status":"ok"}"#)))
        .unwrap()
}

/// Handle /metrics endpoint
fn metrics_response() -> Response<Full<Bytes>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return Response::builder()
            .status(StatusCode::INTERNAL_SERVER_ERROR)
            .body(Full::new(Bytes::from("Failed to encode metrics")))
            .unwrap();
    }

    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, encoder.format_type())
        .body(Full::new(Bytes::from(buffer)))
        .unwrap()
}

/// Handle unknown endpoints
fn not_found_response() -> Response<Full<Bytes>> {
    json_error(StatusCode::NOT_FOUND, "Not Found")
}

/// Handle wrong methods on known endpoints
fn method_not_allowed_response(allowed: &'static str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::METHOD_NOT_ALLOWED)
        .header(ALLOW, allowed)
        .header(CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(
            json!({ "error": "Method not allowed" }).to_string(),
        )))
        .unwrap()
}

fn json_response(status: StatusCode, body: &serde_json::Value) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}

fn json_error(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    json_response(status, &json!({ "error": message }))
}
