// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The websocket boundary, narrowed to what [`crate::session::CoordinatorSession`]
//! actually needs: dial a URL, get back a writer half that multiple loops can
//! share and a reader half the receive loop owns exclusively.

use crate::error::SessionError;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;
use tokio_tungstenite::tungstenite::Message;

/// Send half of a coordinator connection. Shared by the heartbeat,
/// request-when-idle and finish-notify loops behind an `Arc`.
#[async_trait]
pub trait FrameWriter: Send + Sync {
    async fn send(&self, frame: Value) -> Result<(), SessionError>;
}

/// Receive half of a coordinator connection. Owned exclusively by the
/// receive loop — `recv` is not meant to be called concurrently from more
/// than one task.
#[async_trait]
pub trait FrameReader: Send {
    /// The next text frame, or `Ok(None)` once the connection is closed.
    async fn recv(&mut self) -> Result<Option<String>, SessionError>;
}

/// Dials the coordinator's websocket endpoint.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn connect(&self, url: &str) -> Result<(Arc<dyn FrameWriter>, Box<dyn FrameReader>), SessionError>;
}

type WsSink = futures_util::stream::SplitSink<
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>,
    Message,
>;
type WsStream = futures_util::stream::SplitStream<
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>,
>;

/// Real `wss://`/`ws://` connector backed by `tokio-tungstenite`.
#[derive(Debug, Default, Clone, Copy)]
pub struct WebSocketConnector;

#[async_trait]
impl Connector for WebSocketConnector {
    async fn connect(&self, url: &str) -> Result<(Arc<dyn FrameWriter>, Box<dyn FrameReader>), SessionError> {
        let (stream, _response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| SessionError::Connect(e.to_string()))?;

        let (sink, stream) = stream.split();

        Ok((
            Arc::new(WebSocketWriter { sink: AsyncMutex::new(sink) }),
            Box::new(WebSocketReader { stream }),
        ))
    }
}

struct WebSocketWriter {
    sink: AsyncMutex<WsSink>,
}

#[async_trait]
impl FrameWriter for WebSocketWriter {
    async fn send(&self, frame: Value) -> Result<(), SessionError> {
        let text = serde_json::to_string(&frame).map_err(|e| SessionError::Send(e.to_string()))?;
        self.sink
            .lock()
            .await
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| SessionError::Transport(e.to_string()))
    }
}

struct WebSocketReader {
    stream: WsStream,
}

#[async_trait]
impl FrameReader for WebSocketReader {
    async fn recv(&mut self) -> Result<Option<String>, SessionError> {
        loop {
            match self.stream.next().await {
                None => return Ok(None),
                Some(Err(e)) => return Err(SessionError::Transport(e.to_string())),
                Some(Ok(Message::Text(text))) => return Ok(Some(text.to_string())),
                Some(Ok(Message::Close(_))) => return Ok(None),
                // Ping/pong/binary frames carry no coordinator semantics.
                Some(Ok(_)) => continue,
            }
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    /// Scripted connector for session tests: each `connect()` call hands out
    /// the next queued script (or an error), recording the dialed URL.
    #[derive(Clone, Default)]
    pub struct FakeConnector {
        inner: Arc<Mutex<FakeConnectorState>>,
    }

    #[derive(Default)]
    struct FakeConnectorState {
        scripts: VecDeque<Result<Vec<String>, String>>,
        connect_count: u32,
        sent: Arc<Mutex<Vec<Value>>>,
    }

    impl FakeConnector {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue a successful connection whose reader yields `inbound` frames
        /// (as raw JSON text) in order, then reports closed.
        pub fn push_connection(&self, inbound: Vec<String>) {
            self.inner.lock().scripts.push_back(Ok(inbound));
        }

        /// Queue a connection attempt that fails outright.
        pub fn push_connect_failure(&self, message: &str) {
            self.inner.lock().scripts.push_back(Err(message.to_string()));
        }

        pub fn connect_count(&self) -> u32 {
            self.inner.lock().connect_count
        }

        /// Every frame sent on every connection so far, in order.
        pub fn sent(&self) -> Vec<Value> {
            self.inner.lock().sent.lock().clone()
        }
    }

    #[async_trait]
    impl Connector for FakeConnector {
        async fn connect(&self, _url: &str) -> Result<(Arc<dyn FrameWriter>, Box<dyn FrameReader>), SessionError> {
            let (script, sent) = {
                let mut inner = self.inner.lock();
                inner.connect_count += 1;
                let script = inner.scripts.pop_front().unwrap_or(Ok(Vec::new()));
                (script, Arc::clone(&inner.sent))
            };

            let inbound = script.map_err(SessionError::Connect)?;

            Ok((
                Arc::new(FakeWriter { sent }),
                Box::new(FakeReader { inbound: VecDeque::from(inbound) }),
            ))
        }
    }

    struct FakeWriter {
        sent: Arc<Mutex<Vec<Value>>>,
    }

    #[async_trait]
    impl FrameWriter for FakeWriter {
        async fn send(&self, frame: Value) -> Result<(), SessionError> {
            self.sent.lock().push(frame);
            Ok(())
        }
    }

    struct FakeReader {
        inbound: VecDeque<String>,
    }

    #[async_trait]
    impl FrameReader for FakeReader {
        async fn recv(&mut self) -> Result<Option<String>, SessionError> {
            Ok(self.inbound.pop_front())
        }
    }
}
