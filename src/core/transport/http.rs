//! HTTP transport implementation.
//!
//! Session-based JSON-RPC over HTTP on a single route:
//! - `POST` carries one JSON-RPC message and gets a JSON response
//! - `GET` opens an event stream for the session
//! - `DELETE` ends the session
//!
//! The adapter binds at most one session at a time. The upstream credential is
//! read from the query string of every request and travels with that request
//! only, inside a fresh [`CallContext`].

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode, header, request::Parts},
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{RwLock, watch};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, instrument, warn};

use super::{TransportError, TransportResult, config::HttpConfig};
use crate::core::{CallContext, McpServer};

/// Header carrying the session id.
pub const SESSION_HEADER: &str = "mcp-session-id";

/// Protocol revision announced on initialize.
pub const PROTOCOL_VERSION: &str = "2025-03-26";

/// HTTP transport handler.
pub struct HttpTransport {
    config: HttpConfig,
    /// Flips to `true` once the server starts shutting down.
    shutdown: Arc<watch::Sender<bool>>,
}

/// JSON-RPC request structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<serde_json::Value>,
}

impl JsonRpcRequest {
    /// Messages without an id are notifications and get no response body.
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// JSON-RPC response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC error structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl JsonRpcResponse {
    /// Create a success response.
    pub fn success(id: Option<serde_json::Value>, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: Option<serde_json::Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }

    /// Create an error response from an rmcp error, keeping its data.
    pub fn from_mcp_error(id: Option<serde_json::Value>, err: rmcp::ErrorData) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code: err.code.0,
                message: err.message.into_owned(),
                data: err.data,
            }),
        }
    }

    /// Parse error.
    pub fn parse_error(msg: impl Into<String>) -> Self {
        Self::error(None, -32700, msg)
    }

    /// Method not found error.
    pub fn method_not_found(id: Option<serde_json::Value>) -> Self {
        Self::error(id, -32601, "Method not found")
    }

    /// Invalid request error.
    pub fn invalid_request(id: Option<serde_json::Value>, msg: impl Into<String>) -> Self {
        Self::error(id, -32600, msg)
    }

    /// Invalid params error.
    pub fn invalid_params(id: Option<serde_json::Value>, msg: impl Into<String>) -> Self {
        Self::error(id, -32602, msg)
    }

    /// Internal error.
    pub fn internal_error(id: Option<serde_json::Value>, msg: impl Into<String>) -> Self {
        Self::error(id, -32603, msg)
    }
}

/// Application state shared across HTTP handlers.
///
/// Holds no per-call data: credentials are read from each request.
#[derive(Clone)]
pub struct AppState {
    /// The MCP server instance.
    server: McpServer,
    /// The single session bound to this adapter.
    session: Arc<RwLock<Option<SessionState>>>,
    /// Query parameter carrying the credential.
    credential_param: Arc<str>,
    /// Server-wide shutdown flag; ends every open event stream.
    shutdown: Arc<watch::Sender<bool>>,
}

/// Session state for the bound client.
#[derive(Debug)]
struct SessionState {
    id: String,
    protocol_version: String,
    initialized: bool,
    /// Flips to `true` when the session ends; ends its event streams.
    closed: watch::Sender<bool>,
}

impl SessionState {
    fn new(id: String) -> Self {
        let (closed, _) = watch::channel(false);
        Self {
            id,
            protocol_version: PROTOCOL_VERSION.to_string(),
            initialized: false,
            closed,
        }
    }

    fn close(&self) {
        self.closed.send_replace(true);
    }
}

impl AppState {
    pub fn new(
        server: McpServer,
        credential_param: impl Into<Arc<str>>,
        shutdown: Arc<watch::Sender<bool>>,
    ) -> Self {
        Self {
            server,
            session: Arc::new(RwLock::new(None)),
            credential_param: credential_param.into(),
            shutdown,
        }
    }

    /// End the bound session, if any, and its event streams.
    async fn end_session(&self) -> Option<String> {
        let ended = self.session.write().await.take()?;
        ended.close();
        Some(ended.id)
    }

    /// Check the session header against the bound session.
    async fn require_session(&self, headers: &HeaderMap) -> Result<String, Response> {
        let session = self.session.read().await;
        let Some(bound) = session.as_ref() else {
            return Err(reject(
                StatusCode::BAD_REQUEST,
                "Bad Request: Server not initialized",
            ));
        };

        match headers.get(SESSION_HEADER).and_then(|v| v.to_str().ok()) {
            None => Err(reject(
                StatusCode::BAD_REQUEST,
                "Bad Request: Mcp-Session-Id header is required",
            )),
            Some(id) if id != bound.id => {
                Err(reject(StatusCode::NOT_FOUND, "Session not found"))
            }
            Some(id) => Ok(id.to_string()),
        }
    }

    /// Build the call context for one request.
    fn call_context(&self, parts: Parts, session_id: &str) -> CallContext {
        let credential = credential_from_query(parts.uri.query(), &self.credential_param);
        CallContext::new(credential)
            .with_session(session_id)
            .with_request(Arc::new(parts))
    }
}

/// Extract the credential from a raw query string.
pub fn credential_from_query(query: Option<&str>, param: &str) -> Option<String> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query?).ok()?;
    pairs
        .into_iter()
        .find(|(name, _)| name == param)
        .map(|(_, value)| value)
}

impl HttpTransport {
    /// Create a new HTTP transport with the given config.
    pub fn new(config: HttpConfig) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            config,
            shutdown: Arc::new(shutdown),
        }
    }

    /// Get the bind address.
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    /// Build the axum router for this transport.
    pub fn router(&self, server: McpServer) -> Router {
        let state = AppState::new(
            server,
            self.config.credential_param.as_str(),
            self.shutdown.clone(),
        );

        let mut app = Router::new()
            .route(
                &self.config.rpc_path,
                get(handle_get).post(handle_post).delete(handle_delete),
            )
            .route("/health", get(health_check))
            .route("/", get(root_handler))
            .with_state(state)
            .layer(TraceLayer::new_for_http());

        // Add CORS if enabled
        if self.config.enable_cors {
            let cors = CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
                .expose_headers([header::HeaderName::from_static(SESSION_HEADER)]);
            app = app.layer(cors);
        }

        app
    }

    /// Mark the server as shutting down, ending every open event stream.
    pub fn begin_shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    /// Run the HTTP transport until Ctrl-C or SIGTERM.
    pub async fn run(self, server: McpServer) -> TransportResult<()> {
        let addr = self.address();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| TransportError::bind(&addr, e))?;

        info!("Ready - listening on {} (MCP over HTTP)", addr);
        info!("  → MCP:    POST/GET/DELETE {}", self.config.rpc_path);
        info!("  → Health: GET /health");

        self.serve(listener, server, shutdown_signal()).await
    }

    /// Serve on an already-bound listener until `signal` resolves.
    ///
    /// Open event streams are ended when the signal fires so that in-flight
    /// responses can drain and the server returns.
    pub async fn serve<F>(
        self,
        listener: TcpListener,
        server: McpServer,
        signal: F,
    ) -> TransportResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router(server);
        let shutdown = self.shutdown;

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                signal.await;
                shutdown.send_replace(true);
            })
            .await
            .map_err(|e| TransportError::http(e.to_string()))?;

        info!("HTTP transport closed");
        Ok(())
    }
}

/// Resolve on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Ctrl-C received, closing server"),
        _ = terminate => info!("SIGTERM received, closing server"),
    }
}

/// Root handler - provides API info.
async fn root_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "name": state.server.name(),
        "version": state.server.version(),
        "transport": "HTTP",
        "protocol": "JSON-RPC 2.0",
        "tools": state.server.registry().names(),
        "documentation": "Send POST requests to the MCP endpoint with ?key=<api key>"
    }))
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Build a JSON-RPC error response with no id and the given status.
fn reject(status: StatusCode, message: &str) -> Response {
    warn!(status = status.as_u16(), "{}", message);
    (
        status,
        Json(JsonRpcResponse::invalid_request(None, message)),
    )
        .into_response()
}

/// Attach the session header to a response.
fn with_session(mut response: Response, session_id: &str) -> Response {
    if let Ok(value) = HeaderValue::from_str(session_id) {
        response.headers_mut().insert(SESSION_HEADER, value);
    }
    response
}

/// Handle a JSON-RPC message.
#[instrument(skip_all, fields(method = tracing::field::Empty))]
async fn handle_post(State(state): State<AppState>, parts: Parts, body: Bytes) -> Response {
    let request: JsonRpcRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => {
            warn!("Unparseable JSON-RPC body: {}", e);
            return (
                StatusCode::BAD_REQUEST,
                Json(JsonRpcResponse::parse_error(format!("Parse error: {e}"))),
            )
                .into_response();
        }
    };

    tracing::Span::current().record("method", request.method.as_str());
    info!("Received JSON-RPC request: {}", request.method);

    if request.jsonrpc != "2.0" {
        return (
            StatusCode::BAD_REQUEST,
            Json(JsonRpcResponse::invalid_request(request.id, "Invalid Request")),
        )
            .into_response();
    }

    if request.method == "initialize" {
        return handle_initialize(&state, request).await;
    }

    let session_id = match state.require_session(&parts.headers).await {
        Ok(id) => id,
        Err(rejection) => return rejection,
    };

    if request.is_notification() {
        handle_notification(&state, &request).await;
        return with_session(StatusCode::ACCEPTED.into_response(), &session_id);
    }

    let context = state.call_context(parts, &session_id);
    let response = process_request(&state, request, context).await;

    with_session((StatusCode::OK, Json(response)).into_response(), &session_id)
}

/// Open the session event stream.
///
/// Responses are always returned on the POST that carried the request, so
/// this stream only carries keep-alives.
async fn handle_get(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let accepts_sse = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("text/event-stream"));
    if !accepts_sse {
        return reject(
            StatusCode::NOT_ACCEPTABLE,
            "Not Acceptable: Client must accept text/event-stream",
        );
    }

    let session_id = match state.require_session(&headers).await {
        Ok(id) => id,
        Err(rejection) => return rejection,
    };

    let mut closed = match state.session.read().await.as_ref() {
        Some(bound) if bound.id == session_id => bound.closed.subscribe(),
        _ => return reject(StatusCode::NOT_FOUND, "Session not found"),
    };
    let mut shutdown = state.shutdown.subscribe();
    let ended = async move {
        tokio::select! {
            _ = shutdown.wait_for(|stopping| *stopping) => {
                debug!("Event stream closed by shutdown");
            }
            _ = closed.wait_for(|done| *done) => {
                debug!("Event stream closed with its session");
            }
        }
    };

    info!("Event stream opened for session {}", session_id);
    let stream = futures::StreamExt::take_until(
        futures::stream::pending::<Result<Event, Infallible>>(),
        ended,
    );
    with_session(
        Sse::new(stream).keep_alive(KeepAlive::default()).into_response(),
        &session_id,
    )
}

/// Terminate the bound session.
async fn handle_delete(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(rejection) = state.require_session(&headers).await {
        return rejection;
    }

    if let Some(session_id) = state.end_session().await {
        info!("Session {} terminated", session_id);
    }
    StatusCode::OK.into_response()
}

/// Handle initialize request - binds the adapter's session.
async fn handle_initialize(state: &AppState, request: JsonRpcRequest) -> Response {
    info!("Processing initialize request");

    let mut session = state.session.write().await;
    if session.is_some() {
        drop(session);
        return reject(StatusCode::BAD_REQUEST, "Invalid Request: Server already initialized");
    }

    let id = uuid::Uuid::new_v4().simple().to_string();
    *session = Some(SessionState::new(id.clone()));
    drop(session);

    let result = serde_json::json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {
            "tools": { "listChanged": false }
        },
        "serverInfo": {
            "name": state.server.name(),
            "version": state.server.version()
        },
        "instructions": crate::core::server::INSTRUCTIONS
    });

    info!("Session {} created", id);
    with_session(
        (StatusCode::OK, Json(JsonRpcResponse::success(request.id, result))).into_response(),
        &id,
    )
}

/// Process a session-bound JSON-RPC request and return the response.
async fn process_request(
    state: &AppState,
    request: JsonRpcRequest,
    context: CallContext,
) -> JsonRpcResponse {
    match request.method.as_str() {
        "ping" => JsonRpcResponse::success(request.id, serde_json::json!({})),

        // List available tools
        "tools/list" => handle_tools_list(state, request).await,

        // Call a tool
        "tools/call" => handle_tools_call(state, request, context).await,

        // Unknown method
        _ => {
            warn!("Unknown method: {}", request.method);
            JsonRpcResponse::method_not_found(request.id)
        }
    }
}

/// Handle tools/list request.
async fn handle_tools_list(state: &AppState, request: JsonRpcRequest) -> JsonRpcResponse {
    info!("Processing tools/list request");

    let result = serde_json::json!({
        "tools": state.server.tools()
    });

    JsonRpcResponse::success(request.id, result)
}

/// Handle tools/call request.
async fn handle_tools_call(
    state: &AppState,
    request: JsonRpcRequest,
    context: CallContext,
) -> JsonRpcResponse {
    info!("Processing tools/call request");

    let params = match request.params {
        Some(p) => p,
        None => return JsonRpcResponse::invalid_params(request.id, "Missing params"),
    };

    let name = match params.get("name").and_then(|v| v.as_str()) {
        Some(n) => n.to_string(),
        None => return JsonRpcResponse::invalid_params(request.id, "Missing tool name"),
    };

    let arguments = match params.get("arguments") {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::Object(map)) => Some(map.clone()),
        Some(_) => {
            return JsonRpcResponse::invalid_params(request.id, "Arguments must be an object");
        }
    };

    match state.server.invoke(&name, arguments, context).await {
        Ok(result) => match serde_json::to_value(&result) {
            Ok(value) => JsonRpcResponse::success(request.id, value),
            Err(e) => JsonRpcResponse::internal_error(request.id, e.to_string()),
        },
        Err(e) => JsonRpcResponse::from_mcp_error(request.id, e),
    }
}

/// Handle notifications (no response body).
async fn handle_notification(state: &AppState, request: &JsonRpcRequest) {
    match request.method.as_str() {
        "notifications/initialized" => {
            let mut session = state.session.write().await;
            if let Some(ref mut s) = *session
                && !s.initialized
            {
                s.initialized = true;
                debug!(
                    "Client initialized session {} ({})",
                    s.id, s.protocol_version
                );
            }
        }
        _ => {
            info!("Received notification: {}", request.method);
        }
    }
}
