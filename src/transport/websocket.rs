use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use async_trait::async_trait;
use futures_util::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use tokio::{
    net::TcpStream,
    sync::{mpsc, Mutex},
};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::transport::{
    decode_inbound, encode_outbound, ConnectionState, InboundEvent, OutboundEvent, Transport,
    TransportError,
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Live connection to the order server over a single WebSocket.
///
/// Established once and held until closed. A background reader task decodes
/// server frames into [`InboundEvent`]s; when the socket ends the task marks
/// the transport disconnected and closes the inbound channel. There is no
/// reconnection.
pub struct WebSocketTransport {
    writer: Mutex<SplitSink<WsStream, Message>>,
    connected: Arc<AtomicBool>,
}

impl WebSocketTransport {
    pub async fn connect(
        url: &Url,
    ) -> Result<(Self, mpsc::UnboundedReceiver<InboundEvent>), TransportError> {
        info!("Connecting to order server at {}", url);
        let (stream, _response) = connect_async(url.as_str()).await.map_err(|e| {
            error!("Failed to connect to {}: {}", url, e);
            TransportError::WebSocket(e)
        })?;
        info!("Connected to order server");

        let (writer, reader) = stream.split();
        let connected = Arc::new(AtomicBool::new(true));
        let (sender, receiver) = mpsc::unbounded_channel();

        tokio::spawn(read_frames(reader, sender, connected.clone()));

        Ok((
            Self {
                writer: Mutex::new(writer),
                connected,
            },
            receiver,
        ))
    }

    pub async fn close(&self) -> Result<(), TransportError> {
        self.connected.store(false, Ordering::SeqCst);
        self.writer.lock().await.close().await?;
        info!("Order server connection closed");
        Ok(())
    }
}

async fn read_frames(
    mut reader: SplitStream<WsStream>,
    sender: mpsc::UnboundedSender<InboundEvent>,
    connected: Arc<AtomicBool>,
) {
    while let Some(frame) = reader.next().await {
        match frame {
            Ok(Message::Text(text)) => match decode_inbound(&text) {
                Ok(event) => {
                    if sender.send(event).is_err() {
                        debug!("Inbound receiver dropped, stopping reader");
                        break;
                    }
                }
                Err(e) => warn!("Dropping undecodable frame: {}", e),
            },
            Ok(Message::Close(reason)) => {
                info!("Server closed the connection: {:?}", reason);
                break;
            }
            Ok(_) => {}
            Err(e) => {
                warn!("Connection error: {}", e);
                break;
            }
        }
    }
    connected.store(false, Ordering::SeqCst);
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn emit(&self, event: OutboundEvent) -> Result<(), TransportError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(TransportError::Disconnected);
        }

        let frame = encode_outbound(&event)?;
        debug!("Emitting {}: {}", event.name(), frame);

        let mut writer = self.writer.lock().await;
        if let Err(e) = writer.send(Message::Text(frame)).await {
            error!("Failed to emit {}: {}", event.name(), e);
            self.connected.store(false, Ordering::SeqCst);
            return Err(TransportError::WebSocket(e));
        }
        Ok(())
    }

    fn state(&self) -> ConnectionState {
        if self.connected.load(Ordering::SeqCst) {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }
}
