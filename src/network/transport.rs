//! Peer Transport
//!
//! The session talks to its peer through a non-blocking [`Transport`]:
//! `send` appends, `drain` takes everything received since the last frame.
//! Two implementations share [`ChannelTransport`]: an in-process pair for
//! local loopback, and a WebSocket connection whose socket is pumped by a
//! background task.

use std::collections::VecDeque;
use std::net::SocketAddr;

use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};
use tokio_tungstenite::{accept_async, connect_async, tungstenite::Message, WebSocketStream};
use tracing::{debug, error, info, warn};

use crate::network::protocol::{NetMessage, ProtocolError, StateSnapshot};

/// Connection-level failures. None of these are fatal to a local simulation.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The peer is gone.
    #[error("connection closed")]
    Closed,

    /// Could not establish the connection.
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// WebSocket failure.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Socket accept failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Duplex message channel to the peer.
pub trait Transport: Send {
    /// Queue a message for the peer.
    fn send(&mut self, msg: NetMessage) -> Result<(), TransportError>;

    /// Take every message received since the last call, oldest first.
    fn drain(&mut self) -> Vec<NetMessage>;

    /// Whether the peer is still reachable.
    fn is_open(&self) -> bool;

    /// Drop the connection.
    fn close(&mut self);
}

// =============================================================================
// MESSAGE QUEUE
// =============================================================================

/// Append/drain buffer between the frame loop and the transport.
#[derive(Debug, Default)]
pub struct MessageQueue {
    inner: VecDeque<NetMessage>,
}

impl MessageQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message.
    pub fn push(&mut self, msg: NetMessage) {
        self.inner.push_back(msg);
    }

    /// Remove and return everything, oldest first.
    pub fn drain(&mut self) -> Vec<NetMessage> {
        self.inner.drain(..).collect()
    }

    /// Queued messages.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Nothing queued.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

// =============================================================================
// CHANNEL TRANSPORT
// =============================================================================

/// Transport over a pair of unbounded tokio channels.
#[derive(Debug)]
pub struct ChannelTransport {
    outbound: Option<UnboundedSender<NetMessage>>,
    inbound: Option<UnboundedReceiver<NetMessage>>,
    peer: String,
}

impl ChannelTransport {
    fn from_parts(outbound: UnboundedSender<NetMessage>, inbound: UnboundedReceiver<NetMessage>, peer: String) -> Self {
        Self {
            outbound: Some(outbound),
            inbound: Some(inbound),
            peer,
        }
    }

    /// Two connected in-process endpoints: `(host side, client side)`.
    pub fn pair() -> (Self, Self) {
        let (a_tx, a_rx) = mpsc::unbounded_channel();
        let (b_tx, b_rx) = mpsc::unbounded_channel();
        (
            Self::from_parts(a_tx, b_rx, "loopback-client".to_string()),
            Self::from_parts(b_tx, a_rx, "loopback-host".to_string()),
        )
    }

    /// Human-readable peer name.
    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Wait for the next message. `None` once the peer is gone.
    pub async fn recv(&mut self) -> Option<NetMessage> {
        let inbound = self.inbound.as_mut()?;
        let msg = inbound.recv().await;
        if msg.is_none() {
            self.mark_closed();
        }
        msg
    }

    fn mark_closed(&mut self) {
        if self.outbound.take().is_some() {
            info!(peer = %self.peer, "Peer disconnected");
        }
        self.inbound = None;
    }
}

impl Transport for ChannelTransport {
    fn send(&mut self, msg: NetMessage) -> Result<(), TransportError> {
        let outbound = self.outbound.as_ref().ok_or(TransportError::Closed)?;
        if outbound.send(msg).is_err() {
            self.mark_closed();
            return Err(TransportError::Closed);
        }
        Ok(())
    }

    fn drain(&mut self) -> Vec<NetMessage> {
        let mut received = Vec::new();
        let Some(inbound) = self.inbound.as_mut() else {
            return received;
        };

        loop {
            match inbound.try_recv() {
                Ok(msg) => received.push(msg),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.mark_closed();
                    break;
                }
            }
        }
        received
    }

    fn is_open(&self) -> bool {
        self.outbound.as_ref().is_some_and(|tx| !tx.is_closed())
    }

    fn close(&mut self) {
        self.mark_closed();
    }
}

// =============================================================================
// WEBSOCKET
// =============================================================================

/// Connect to a host at `url` (e.g. `ws://127.0.0.1:9000`).
pub async fn connect(url: &str) -> Result<ChannelTransport, TransportError> {
    let (ws, _response) = connect_async(url)
        .await
        .map_err(|e| TransportError::Handshake(e.to_string()))?;
    info!(%url, "Connected to host");
    Ok(spawn_pump(ws, url.to_string()))
}

/// Accept one client on `listener`.
pub async fn accept(listener: &TcpListener) -> Result<(ChannelTransport, SocketAddr), TransportError> {
    let (stream, addr) = listener.accept().await?;
    let ws = accept_async(stream).await?;
    info!(%addr, "Client connected");
    Ok((spawn_pump(ws, addr.to_string()), addr))
}

/// Move messages between a WebSocket and a [`ChannelTransport`].
///
/// STATE goes out as a bincode frame, everything else as JSON text.
fn spawn_pump<S>(ws: WebSocketStream<S>, peer: String) -> ChannelTransport
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<NetMessage>();
    let (in_tx, in_rx) = mpsc::unbounded_channel::<NetMessage>();
    let task_peer = peer.clone();

    tokio::spawn(async move {
        let (mut ws_sender, mut ws_receiver) = ws.split();

        loop {
            tokio::select! {
                outgoing = out_rx.recv() => {
                    let Some(msg) = outgoing else {
                        let _ = ws_sender.send(Message::Close(None)).await;
                        break;
                    };
                    let frame = match encode(&msg) {
                        Ok(frame) => frame,
                        Err(e) => {
                            error!(peer = %task_peer, kind = msg.kind(), "Failed to serialize message: {}", e);
                            continue;
                        }
                    };
                    if ws_sender.send(frame).await.is_err() {
                        break;
                    }
                }
                incoming = ws_receiver.next() => {
                    match incoming {
                        Some(Ok(Message::Text(text))) => match NetMessage::from_json(&text) {
                            Ok(msg) => {
                                if in_tx.send(msg).is_err() {
                                    break;
                                }
                            }
                            Err(e) => warn!(peer = %task_peer, "Dropping undecodable message: {}", e),
                        },
                        Some(Ok(Message::Binary(data))) => match StateSnapshot::from_bytes(&data) {
                            Ok(snapshot) => {
                                if in_tx.send(NetMessage::State(snapshot)).is_err() {
                                    break;
                                }
                            }
                            Err(e) => warn!(peer = %task_peer, "Dropping undecodable snapshot: {}", e),
                        },
                        Some(Ok(Message::Close(_))) | None => {
                            debug!(peer = %task_peer, "WebSocket closed");
                            break;
                        }
                        Some(Err(e)) => {
                            error!(peer = %task_peer, "WebSocket error: {}", e);
                            break;
                        }
                        _ => {}
                    }
                }
            }
        }
    });

    ChannelTransport::from_parts(out_tx, in_rx, peer)
}

fn encode(msg: &NetMessage) -> Result<Message, ProtocolError> {
    match msg {
        NetMessage::State(snapshot) => Ok(Message::Binary(snapshot.to_bytes()?)),
        other => Ok(Message::Text(other.to_json()?)),
    }
}
