//! WebSocket handler for the shared chat room.
//!
//! The `/ws` endpoint upgrades an HTTP connection to a WebSocket and joins
//! the caller to the hub. Once connected:
//!
//! - **Inbound:** every text frame is wrapped into a [`ChatMessage`] stamped
//!   with the caller's user id and broadcast to all sessions, the sender
//!   included.
//! - **Outbound:** frames queued by the hub are written to the socket as
//!   text, in the order they were broadcast.
//!
//! A client that cannot keep up with its queue is dropped by the hub; its
//! socket receives a close frame once the already-queued frames are sent.
//!
//! [`ChatMessage`]: campus_types::chat::ChatMessage

use std::net::SocketAddr;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::response::IntoResponse;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use uuid::Uuid;

use campus_core::hub::{
    OutboundFrame, TransportError, TransportReader, TransportWriter, spawn_session,
};
use campus_types::session::{SessionId, UserId};

use crate::http::extractors::identity::AuthenticatedUser;
use crate::state::AppState;

/// Read half of a chat WebSocket.
pub struct WsReader {
    stream: SplitStream<WebSocket>,
}

/// Write half of a chat WebSocket.
pub struct WsWriter {
    sink: SplitSink<WebSocket, Message>,
}

/// Split an upgraded socket into transport halves for the pumps.
pub fn split_socket(socket: WebSocket) -> (WsReader, WsWriter) {
    let (sink, stream) = socket.split();
    (WsReader { stream }, WsWriter { sink })
}

/// What an incoming WebSocket frame means for the inbound pump.
#[derive(Debug, PartialEq, Eq)]
enum FrameAction {
    Payload(String),
    Skip,
    Closed,
}

fn classify(message: Message) -> FrameAction {
    match message {
        Message::Text(text) => FrameAction::Payload(text.as_str().to_owned()),
        // Binary payloads are relayed as text; invalid UTF-8 is replaced.
        Message::Binary(bytes) => {
            FrameAction::Payload(String::from_utf8_lossy(&bytes).into_owned())
        }
        // Ping/pong are answered by the protocol layer
        Message::Ping(_) | Message::Pong(_) => FrameAction::Skip,
        Message::Close(_) => FrameAction::Closed,
    }
}

impl TransportReader for WsReader {
    async fn receive(&mut self) -> Result<Option<String>, TransportError> {
        loop {
            match self.stream.next().await {
                Some(Ok(message)) => match classify(message) {
                    FrameAction::Payload(text) => return Ok(Some(text)),
                    FrameAction::Skip => continue,
                    FrameAction::Closed => return Ok(None),
                },
                Some(Err(err)) => return Err(TransportError::ConnectionLost(err.to_string())),
                None => return Ok(None),
            }
        }
    }
}

impl TransportWriter for WsWriter {
    async fn send(&mut self, frame: OutboundFrame) -> Result<(), TransportError> {
        self.sink
            .send(Message::Text(frame.as_ref().into()))
            .await
            .map_err(|err| TransportError::Write(err.to_string()))
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.sink
            .send(Message::Close(None))
            .await
            .map_err(|err| TransportError::Write(err.to_string()))
    }
}

/// Upgrade an HTTP request to a chat WebSocket.
///
/// This is mounted at `/ws` in the router. The caller must carry a user id
/// (see [`AuthenticatedUser`]); otherwise the upgrade is refused with 401.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    AuthenticatedUser(user_id): AuthenticatedUser,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws_connection(socket, state, remote, user_id))
}

/// Session ids are unique per connection even when one address reconnects.
fn session_id_for(remote: SocketAddr) -> SessionId {
    SessionId::new(format!("{remote}/{}", Uuid::now_v7()))
}

/// Register the connection with the hub and supervise its pumps.
async fn handle_ws_connection(
    socket: WebSocket,
    state: AppState,
    remote: SocketAddr,
    user_id: UserId,
) {
    let session_id = session_id_for(remote);

    let (session, queue) = match state.hub.register(session_id.clone(), user_id) {
        Ok(registered) => registered,
        Err(err) => {
            tracing::warn!(session = %session_id, error = %err, "Rejecting WebSocket session");
            let (_, mut writer) = split_socket(socket);
            let _ = writer.close().await;
            return;
        }
    };

    tracing::info!(
        session = %session_id,
        user = %user_id,
        sessions = state.hub.session_count(),
        "Chat session connected"
    );

    let (reader, writer) = split_socket(socket);
    let tasks = spawn_session(
        state.hub.clone(),
        session,
        queue,
        reader,
        writer,
        state.pump_options(),
    );
    let handle = tasks.session().clone();

    match tasks.join().await {
        Ok((inbound, outbound)) => {
            tracing::info!(
                session = %session_id,
                ?inbound,
                ?outbound,
                "Chat session closed"
            );
        }
        Err(err) => {
            tracing::error!(session = %session_id, error = %err, "Chat session task panicked");
            state.hub.unregister(&handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::extract::ws::CloseFrame;
    use campus_types::chat::ChatMessage;
    use campus_types::config::ChatConfig;
    use tokio::time::timeout;
    use tokio_tungstenite::connect_async;
    use tokio_tungstenite::tungstenite::Message as ClientMessage;

    use crate::http::router::build_router;

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[test]
    fn text_frames_are_payloads() {
        assert_eq!(
            classify(Message::Text("hi".into())),
            FrameAction::Payload("hi".to_string())
        );
    }

    #[test]
    fn binary_frames_are_decoded_lossily() {
        let bytes = vec![b'o', b'k', 0xff];
        assert_eq!(
            classify(Message::Binary(bytes.into())),
            FrameAction::Payload("ok\u{fffd}".to_string())
        );
    }

    #[test]
    fn control_frames_are_skipped() {
        assert_eq!(classify(Message::Ping(Vec::new().into())), FrameAction::Skip);
        assert_eq!(classify(Message::Pong(Vec::new().into())), FrameAction::Skip);
    }

    #[test]
    fn close_frames_end_the_session() {
        assert_eq!(classify(Message::Close(None)), FrameAction::Closed);
        let frame = CloseFrame {
            code: 1001,
            reason: "going away".into(),
        };
        assert_eq!(classify(Message::Close(Some(frame))), FrameAction::Closed);
    }

    #[test]
    fn session_ids_are_unique_per_connection() {
        let addr: SocketAddr = "127.0.0.1:5000".parse().unwrap();
        let a = session_id_for(addr);
        let b = session_id_for(addr);
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("127.0.0.1:5000/"));
    }

    #[tokio::test]
    async fn loopback_session_relays_envelope_and_closes_on_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::open(dir.path().to_path_buf(), ChatConfig::default())
            .await
            .unwrap();
        let hub = Arc::clone(&state.hub);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = build_router(state).into_make_service_with_connect_info::<SocketAddr>();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        let (mut ws, _) = connect_async(format!("ws://{addr}/ws?user_id=7")).await.unwrap();
        ws.send(ClientMessage::text("hello")).await.unwrap();

        let frame = timeout(TIMEOUT, ws.next()).await.unwrap().unwrap().unwrap();
        let ClientMessage::Text(text) = frame else {
            panic!("expected text frame, got {frame:?}");
        };
        let msg: ChatMessage = serde_json::from_str(&text).unwrap();
        assert_eq!(msg.kind, "message");
        assert_eq!(msg.content, "hello");
        assert_eq!(msg.sender_id, UserId(7));

        assert_eq!(hub.shutdown(), 1);
        let frame = timeout(TIMEOUT, ws.next()).await.unwrap().unwrap().unwrap();
        assert!(matches!(frame, ClientMessage::Close(_)), "got {frame:?}");
    }
}
