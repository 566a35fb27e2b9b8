//! HTTP transport: MCP over Server-Sent Events
//!
//! `GET /sse` opens a session. The first event on the stream (`endpoint`)
//! names the URL the client posts its JSON-RPC messages to, and every
//! response is delivered back on the stream as a `message` event.

use crate::mcp::protocol::JsonRpcResponse;
use crate::mcp::server::{McpServer, Session};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use futures::future;
use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;
use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const SSE_PATH: &str = "/sse";
pub const MESSAGES_PATH: &str = "/messages";

type Sessions = Arc<Mutex<HashMap<String, Arc<SseSession>>>>;

struct SseSession {
    outbound: mpsc::UnboundedSender<JsonRpcResponse>,
    state: tokio::sync::Mutex<Session>,
}

#[derive(Clone)]
struct HttpState {
    server: McpServer,
    sessions: Sessions,
}

impl HttpState {
    fn session(&self, id: &str) -> Option<Arc<SseSession>> {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }
}

/// Removes a session from the registry once its event stream is dropped.
struct SessionGuard {
    id: String,
    sessions: Sessions,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
        info!("SSE session closed: {}", self.id);
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageQuery {
    session_id: String,
}

impl McpServer {
    /// Routes for the SSE transport
    pub fn http_router(&self) -> Router {
        let state = HttpState {
            server: self.clone(),
            sessions: Sessions::default(),
        };

        Router::new()
            .route(SSE_PATH, get(open_stream))
            .route(MESSAGES_PATH, post(post_message))
            .with_state(state)
    }

    /// Serve MCP over HTTP/SSE until the listener fails
    pub async fn run_http(&self, addr: SocketAddr) -> anyhow::Result<()> {
        let listener = TcpListener::bind(addr).await?;
        info!(
            "MCP server listening on http://{}{}",
            listener.local_addr()?,
            SSE_PATH
        );

        axum::serve(listener, self.http_router()).await?;
        Ok(())
    }
}

async fn open_stream(
    State(state): State<HttpState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let id = Uuid::new_v4().simple().to_string();
    let (outbound, inbound) = mpsc::unbounded_channel();

    state.sessions.lock().unwrap_or_else(PoisonError::into_inner).insert(
        id.clone(),
        Arc::new(SseSession {
            outbound,
            state: tokio::sync::Mutex::new(Session::default()),
        }),
    );
    info!("SSE session opened: {}", id);

    let endpoint = Event::default()
        .event("endpoint")
        .data(format!("{}?sessionId={}", MESSAGES_PATH, id));

    let guard = SessionGuard {
        id,
        sessions: state.sessions.clone(),
    };

    let messages = UnboundedReceiverStream::new(inbound).filter_map(move |response| {
        let _guard = &guard;
        let event = match serde_json::to_string(&response) {
            Ok(json) => Some(Ok(Event::default().event("message").data(json))),
            Err(e) => {
                warn!("Failed to serialize response: {}", e);
                None
            }
        };
        future::ready(event)
    });

    Sse::new(stream::once(future::ready(Ok(endpoint))).chain(messages))
        .keep_alive(KeepAlive::default())
}

async fn post_message(
    State(state): State<HttpState>,
    Query(query): Query<MessageQuery>,
    body: String,
) -> Response {
    let Some(session) = state.session(&query.session_id) else {
        return (StatusCode::NOT_FOUND, "Unknown session").into_response();
    };

    debug!("Received request on {}: {}", query.session_id, body.trim());

    let response = {
        let mut protocol = session.state.lock().await;
        state.server.handle_message(&mut protocol, body.trim()).await
    };

    if let Some(response) = response {
        if session.outbound.send(response).is_err() {
            warn!("SSE stream for {} is gone", query.session_id);
            return (StatusCode::GONE, "Session closed").into_response();
        }
    }

    StatusCode::ACCEPTED.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::harness;
    use serde_json::Value;
    use std::time::Duration;

    /// Next `(event, data)` pair from an SSE response, skipping keep-alives.
    async fn next_event(response: &mut reqwest::Response, buf: &mut String) -> (String, String) {
        loop {
            if let Some(end) = buf.find("\n\n") {
                let frame: String = buf.drain(..end + 2).collect();
                let mut event = "message".to_string();
                let mut data = Vec::new();
                for line in frame.lines() {
                    if let Some(value) = line.strip_prefix("event:") {
                        event = value.trim().to_string();
                    } else if let Some(value) = line.strip_prefix("data:") {
                        data.push(value.trim_start().to_string());
                    }
                }
                if !data.is_empty() {
                    return (event, data.join("\n"));
                }
                continue;
            }

            let chunk = tokio::time::timeout(Duration::from_secs(5), response.chunk())
                .await
                .expect("timed out waiting for an event")
                .unwrap()
                .expect("stream ended");
            buf.push_str(&String::from_utf8_lossy(&chunk));
        }
    }

    struct Client {
        http: reqwest::Client,
        base: String,
        stream: reqwest::Response,
        buf: String,
        endpoint: String,
    }

    impl Client {
        async fn connect(base: &str) -> Self {
            let http = reqwest::Client::new();
            let mut stream = http.get(format!("{}{}", base, SSE_PATH)).send().await.unwrap();
            assert_eq!(stream.headers()["content-type"], "text/event-stream");

            let mut buf = String::new();
            let (event, endpoint) = next_event(&mut stream, &mut buf).await;
            assert_eq!(event, "endpoint");

            Self {
                http,
                base: base.to_string(),
                stream,
                buf,
                endpoint,
            }
        }

        async fn post(&self, body: &str) -> StatusCode {
            let response = self
                .http
                .post(format!("{}{}", self.base, self.endpoint))
                .body(body.to_string())
                .send()
                .await
                .unwrap();
            StatusCode::from_u16(response.status().as_u16()).unwrap()
        }

        async fn reply(&mut self) -> Value {
            let (event, data) = next_event(&mut self.stream, &mut self.buf).await;
            assert_eq!(event, "message");
            serde_json::from_str(&data).unwrap()
        }
    }

    async fn spawn_server(server: McpServer) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = server.http_router();
        tokio::spawn(async move { axum::serve(listener, app).await });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_sse_session_round_trip() {
        let h = harness();
        let base = spawn_server(McpServer::new(Arc::new(h.toolbox.clone()))).await;
        let mut client = Client::connect(&base).await;
        assert!(client.endpoint.starts_with("/messages?sessionId="));

        let status = client
            .post(r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05","capabilities":{},"clientInfo":{"name":"sse-test"}}}"#)
            .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        let reply = client.reply().await;
        assert_eq!(reply["id"], 1);
        assert_eq!(reply["result"]["serverInfo"]["name"], "engram-mcp");

        let status = client
            .post(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await;
        assert_eq!(status, StatusCode::ACCEPTED);

        client
            .post(r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"remember_fact","arguments":{"fact":"deploys freeze on Fridays"}}}"#)
            .await;
        let reply = client.reply().await;
        assert_eq!(reply["id"], 2);
        assert_eq!(
            reply["result"]["content"][0]["text"],
            "Remembered: deploys freeze on Fridays"
        );
        assert_eq!(h.facts(), vec!["deploys freeze on Fridays"]);
    }

    #[tokio::test]
    async fn test_sse_sessions_are_independent() {
        let h = harness();
        let base = spawn_server(McpServer::new(Arc::new(h.toolbox.clone()))).await;
        let mut first = Client::connect(&base).await;
        let mut second = Client::connect(&base).await;
        assert_ne!(first.endpoint, second.endpoint);

        first
            .post(r#"{"jsonrpc":"2.0","id":1,"method":"initialize"}"#)
            .await;
        assert!(first.reply().await["result"].is_object());

        second
            .post(r#"{"jsonrpc":"2.0","id":9,"method":"tools/call","params":{"name":"get_recent_memories"}}"#)
            .await;
        let reply = second.reply().await;
        assert_eq!(reply["id"], 9);
        assert_eq!(reply["error"]["message"], "Server not initialized");
    }

    #[tokio::test]
    async fn test_unknown_session_is_rejected() {
        let h = harness();
        let base = spawn_server(McpServer::new(Arc::new(h.toolbox.clone()))).await;

        let response = reqwest::Client::new()
            .post(format!("{}{}?sessionId=missing", base, MESSAGES_PATH))
            .body(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 404);
    }
}
