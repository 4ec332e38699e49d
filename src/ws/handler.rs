//! WebSocket upgrade handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::game::{ArenaHandle, SessionId};
use crate::ws::protocol::{ClientMsg, ServerMsg};

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let session_id: SessionId = Uuid::new_v4();
    info!(session_id = %session_id, "New WebSocket connection");

    let (ws_sink, ws_stream) = socket.split();
    let (outbox_tx, outbox_rx) = mpsc::channel::<ServerMsg>(state.config.outbox_capacity);

    if let Err(e) = state.arena.connect(session_id, outbox_tx).await {
        error!(session_id = %session_id, error = %e, "Failed to join arena");
        return;
    }

    run_session(session_id, ws_sink, ws_stream, outbox_rx, &state.arena).await;

    // Cleanup on disconnect
    if let Err(e) = state.arena.disconnect(session_id).await {
        debug!(session_id = %session_id, error = %e, "Arena gone before disconnect");
    }

    info!(session_id = %session_id, "WebSocket connection closed");
}

/// Run the WebSocket session with read/write split
async fn run_session(
    session_id: SessionId,
    mut ws_sink: futures::stream::SplitSink<WebSocket, Message>,
    mut ws_stream: futures::stream::SplitStream<WebSocket>,
    mut outbox_rx: mpsc::Receiver<ServerMsg>,
    arena: &ArenaHandle,
) {
    // Spawn writer task: outbox -> WebSocket
    let writer_handle = tokio::spawn(async move {
        while let Some(msg) = outbox_rx.recv().await {
            if let Err(e) = send_msg(&mut ws_sink, &msg).await {
                debug!(session_id = %session_id, error = %e, "WebSocket send failed");
                break;
            }
        }
        debug!(session_id = %session_id, "Outbox closed");
    });

    // Reader loop: WebSocket -> arena
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMsg>(&text) {
                Ok(ClientMsg::Input(input)) => {
                    if arena.input(session_id, input).await.is_err() {
                        debug!(session_id = %session_id, "Arena closed");
                        break;
                    }
                }
                Err(e) => {
                    warn!(session_id = %session_id, error = %e, "Failed to parse client message");
                }
            },
            Ok(Message::Binary(_)) => {
                warn!(session_id = %session_id, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) => {
                debug!(session_id = %session_id, "Received ping");
            }
            Ok(Message::Pong(_)) => {
                debug!(session_id = %session_id, "Received pong");
            }
            Ok(Message::Close(_)) => {
                info!(session_id = %session_id, "Client initiated close");
                break;
            }
            Err(e) => {
                error!(session_id = %session_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    // Abort writer task
    writer_handle.abort();
}

/// Send a message over WebSocket
async fn send_msg(
    sink: &mut futures::stream::SplitSink<WebSocket, Message>,
    msg: &ServerMsg,
) -> Result<(), String> {
    let json = serde_json::to_string(msg).map_err(|e| e.to_string())?;
    sink.send(Message::Text(json))
        .await
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::game::GameArena;
    use crate::http::build_router;
    use serde_json::{json, Value};
    use std::time::Duration;
    use tokio::net::{TcpListener, TcpStream};
    use tokio::sync::watch;
    use tokio::time::{timeout, Instant};
    use tokio_test::assert_ok;
    use tokio_tungstenite::tungstenite::Message as WsMessage;
    use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

    type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

    async fn start_server() -> (String, watch::Sender<bool>) {
        let config = Config::from_lookup(|_| None).unwrap();
        let (arena, handle) = GameArena::new(5);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(arena.run(shutdown_rx));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = build_router(AppState::new(config, handle));
        tokio::spawn(async move { axum::serve(listener, router).await });

        (format!("ws://{}/ws", addr), shutdown_tx)
    }

    async fn connect(url: &str) -> Client {
        let (client, _) = assert_ok!(connect_async(url).await);
        client
    }

    /// Next text frame as JSON, or None once the wait runs out
    async fn next_frame(client: &mut Client, wait: Duration) -> Option<Value> {
        loop {
            let frame = timeout(wait, client.next()).await.ok()??;
            if let Ok(WsMessage::Text(text)) = frame {
                return Some(serde_json::from_str(&text).unwrap());
            }
        }
    }

    async fn next_event(client: &mut Client, event: &str) -> Value {
        loop {
            let frame = next_frame(client, Duration::from_secs(2))
                .await
                .expect("timed out waiting for event");
            if frame["event"] == event {
                return frame["data"].clone();
            }
        }
    }

    #[tokio::test]
    async fn socket_forwards_input_and_announces_close() {
        let (url, shutdown_tx) = start_server().await;

        let mut a = connect(&url).await;
        let init = next_event(&mut a, "init").await;
        let players = init["players"].as_object().unwrap();
        assert_eq!(players.len(), 1);
        let a_id = players.keys().next().unwrap().clone();

        let mut b = connect(&url).await;
        let init = next_event(&mut b, "init").await;
        assert_eq!(init["players"].as_object().unwrap().len(), 2);
        assert_eq!(init["obstacles"].as_array().unwrap().len(), 10);

        // Junk and binary frames are dropped without closing the connection
        assert_ok!(a.send(WsMessage::Text("not an envelope".into())).await);
        assert_ok!(a.send(WsMessage::Binary(vec![1, 2, 3])).await);
        let fire = json!({ "event": "input", "data": { "fire": true } });
        assert_ok!(a.send(WsMessage::Text(fire.to_string())).await);

        let bullet = next_event(&mut b, "bulletCreated").await;
        assert_eq!(bullet["owner"], a_id.as_str());
        assert_eq!(bullet["speedY"], -8.0);

        assert_ok!(a.close(None).await);

        let left = next_event(&mut b, "playerLeft").await;
        assert_eq!(left, a_id.as_str());

        // No second playerLeft, and A is gone from every later update
        let deadline = Instant::now() + Duration::from_millis(300);
        let mut updates = 0;
        while let Some(frame) = next_frame(&mut b, deadline.saturating_duration_since(Instant::now())).await {
            assert_ne!(frame["event"], "playerLeft");
            if frame["event"] == "update" {
                assert!(frame["data"]["players"].get(&a_id).is_none());
                updates += 1;
            }
        }
        assert!(updates > 0);

        assert_ok!(shutdown_tx.send(true));
    }
}
