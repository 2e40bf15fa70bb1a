use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::error::{KickError, Result};

/// Frame transport consumed by the read loop.
///
/// `receive` and `send` take `&self` so subscriptions can be sent while the
/// reader is parked waiting for the next frame.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Next text frame, or `None` once the transport is closed.
    async fn receive(&self) -> Option<Result<String>>;

    async fn send(&self, frame: String) -> Result<()>;

    fn is_closed(&self) -> bool;
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// [`Transport`] over a tokio-tungstenite websocket.
pub struct WebSocketTransport {
    writer: Mutex<SplitSink<WsStream, WsMessage>>,
    reader: Mutex<SplitStream<WsStream>>,
    closed: AtomicBool,
}

impl WebSocketTransport {
    pub async fn connect(url: &str) -> Result<Self> {
        tracing::debug!(
            target: "kick::pusher::transport::connect",
            "Connecting to {}",
            url
        );
        let (stream, response) = connect_async(url).await?;
        tracing::info!(
            target: "kick::pusher::transport::connect",
            "Connected (HTTP {})",
            response.status()
        );

        let (writer, reader) = stream.split();
        Ok(Self {
            writer: Mutex::new(writer),
            reader: Mutex::new(reader),
            closed: AtomicBool::new(false),
        })
    }

    pub async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        self.writer.lock().await.close().await?;
        Ok(())
    }

    fn mark_closed(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn receive(&self) -> Option<Result<String>> {
        let mut reader = self.reader.lock().await;
        loop {
            match reader.next().await {
                Some(Ok(WsMessage::Text(text))) => return Some(Ok(text)),
                Some(Ok(WsMessage::Close(frame))) => {
                    tracing::info!(
                        target: "kick::pusher::transport::receive",
                        "Server closed the connection: {:?}",
                        frame
                    );
                    self.mark_closed();
                    return None;
                }
                Some(Ok(_)) => continue,
                Some(Err(WsError::ConnectionClosed | WsError::AlreadyClosed)) | None => {
                    self.mark_closed();
                    return None;
                }
                Some(Err(e)) => {
                    self.mark_closed();
                    return Some(Err(KickError::from(e)));
                }
            }
        }
    }

    async fn send(&self, frame: String) -> Result<()> {
        if self.is_closed() {
            return Err(KickError::Transport("connection is closed".to_string()));
        }
        self.writer.lock().await.send(WsMessage::Text(frame)).await?;
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
