//! Chat rooms and the realtime message channel.
//!
//! A [`RoomChannel`] is one duplex WebSocket to `/chat/rooms/{id}/ws`. A
//! background task appends every inbound `{user_id, username, message}`
//! frame to the room's [`MessageLog`] in arrival order. Leaving aborts that
//! task before closing the socket, so frames that arrive afterwards never
//! reach the log. There is no reconnection: a dropped connection simply
//! stops delivery.

use std::fmt;
use std::sync::Arc;

use balanceed_core::{BalanceedError, ChatMessage, ChatRoom, Config, NewChatRoom, Result};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::session::Session;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ============================================================================
// MessageLog
// ============================================================================

/// Append-only, shared list of the messages seen in one room.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    messages: Arc<RwLock<Vec<ChatMessage>>>,
}

impl MessageLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message.
    pub async fn push(&self, message: ChatMessage) {
        self.messages.write().await.push(message);
    }

    /// Appends several messages in order.
    pub async fn extend(&self, messages: impl IntoIterator<Item = ChatMessage>) {
        self.messages.write().await.extend(messages);
    }

    /// Copies the current contents.
    pub async fn snapshot(&self) -> Vec<ChatMessage> {
        self.messages.read().await.clone()
    }

    /// Number of messages logged.
    pub async fn len(&self) -> usize {
        self.messages.read().await.len()
    }

    /// Returns `true` if nothing has been logged.
    pub async fn is_empty(&self) -> bool {
        self.messages.read().await.is_empty()
    }
}

// ============================================================================
// RoomChannel
// ============================================================================

/// An open realtime connection to one chat room.
pub struct RoomChannel {
    room_id: String,
    sender: Session,
    sink: SplitSink<WsStream, Message>,
    reader: Option<JoinHandle<()>>,
    log: MessageLog,
}

impl fmt::Debug for RoomChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoomChannel")
            .field("room_id", &self.room_id)
            .field("user", &self.sender.user.email)
            .field("receiving", &self.reader.is_some())
            .finish_non_exhaustive()
    }
}

impl RoomChannel {
    /// Opens the room's socket as the session user and starts receiving
    /// into `log`.
    ///
    /// # Errors
    ///
    /// Returns `BalanceedError::Channel` if the handshake fails.
    pub async fn open(
        config: &Config,
        session: &Session,
        room_id: &str,
        log: MessageLog,
    ) -> Result<Self> {
        let url = format!("{}/chat/rooms/{room_id}/ws", config.ws_base());
        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| BalanceedError::channel(e.to_string()))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", session.token))
            .map_err(|e| BalanceedError::channel(e.to_string()))?;
        request.headers_mut().insert(AUTHORIZATION, bearer);

        let (stream, _) = connect_async(request)
            .await
            .map_err(|e| BalanceedError::channel(format!("{url}: {e}")))?;
        let (sink, stream) = stream.split();

        info!(room_id, user = %session.user.email, "Joined chat channel");

        let reader = tokio::spawn(receive(stream, log.clone(), room_id.to_string()));
        Ok(Self {
            room_id: room_id.to_string(),
            sender: session.clone(),
            sink,
            reader: Some(reader),
            log,
        })
    }

    /// The room this channel belongs to.
    #[must_use]
    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    /// The log this channel appends to.
    #[must_use]
    pub const fn log(&self) -> &MessageLog {
        &self.log
    }

    /// Sends `text` as the session user.
    ///
    /// Whitespace-only text sends nothing and returns `false`.
    ///
    /// # Errors
    ///
    /// Returns `BalanceedError::Channel` if the frame cannot be written.
    pub async fn send(&mut self, text: &str) -> Result<bool> {
        if text.trim().is_empty() {
            return Ok(false);
        }

        let frame = ChatMessage {
            user_id: self.sender.user.id.clone(),
            username: self.sender.user.name.clone(),
            message: text.to_string(),
            timestamp: None,
        };
        let json = serde_json::to_string(&frame)?;
        self.sink
            .send(Message::Text(json))
            .await
            .map_err(|e| BalanceedError::channel(e.to_string()))?;
        Ok(true)
    }

    /// Stops receiving and closes the socket.
    ///
    /// The receive task has terminated when this returns.
    pub async fn leave(mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
            // A cancelled task is the expected outcome here.
            let _ = reader.await;
        }
        if let Err(e) = self.sink.close().await {
            debug!(room_id = %self.room_id, error = %e, "Close handshake failed");
        }
        info!(room_id = %self.room_id, "Left chat channel");
    }
}

impl Drop for RoomChannel {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }
}

/// Appends inbound frames to `log` until the socket closes or fails.
async fn receive(mut stream: SplitStream<WsStream>, log: MessageLog, room_id: String) {
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => match serde_json::from_str::<ChatMessage>(&text) {
                Ok(message) => log.push(message).await,
                Err(e) => warn!(room_id = %room_id, error = %e, "Skipping malformed chat frame"),
            },
            Ok(Message::Close(_)) => {
                debug!(room_id = %room_id, "Server closed chat channel");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                debug!(room_id = %room_id, error = %e, "Chat channel dropped");
                break;
            }
        }
    }
}

// ============================================================================
// ChatRooms
// ============================================================================

/// REST side of chat: listing, creating, joining and history.
#[derive(Debug, Clone, Copy)]
pub struct ChatRooms<'a> {
    api: &'a ApiClient,
}

impl<'a> ChatRooms<'a> {
    /// Wraps an API client.
    #[must_use]
    pub const fn new(api: &'a ApiClient) -> Self {
        Self { api }
    }

    /// `GET /chat/rooms`.
    pub async fn list(&self) -> Result<Vec<ChatRoom>> {
        self.api.get("/chat/rooms").await
    }

    /// `POST /chat/rooms`.
    pub async fn create(&self, room: &NewChatRoom) -> Result<ChatRoom> {
        if room.name.trim().is_empty() {
            return Err(BalanceedError::missing_fields("chat room", &["name"]));
        }
        self.api.post("/chat/rooms", room).await
    }

    /// `POST /chat/rooms/{id}/join`.
    pub async fn join(&self, room_id: &str) -> Result<Value> {
        self.api
            .post_empty(&format!("/chat/rooms/{room_id}/join"))
            .await
    }

    /// `GET /chat/rooms/{id}/messages`.
    pub async fn history(&self, room_id: &str) -> Result<Vec<ChatMessage>> {
        self.api
            .get(&format!("/chat/rooms/{room_id}/messages"))
            .await
    }

    /// Joins a room, seeds a fresh log with its history and opens the
    /// realtime channel.
    pub async fn enter(
        &self,
        config: &Config,
        session: &Session,
        room_id: &str,
    ) -> Result<RoomChannel> {
        self.join(room_id).await?;

        let log = MessageLog::new();
        match self.history(room_id).await {
            Ok(history) => log.extend(history).await,
            Err(e) => warn!(room_id, error = %e, "Failed to load chat history"),
        }

        RoomChannel::open(config, session, room_id, log).await
    }
}
