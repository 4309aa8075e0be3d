use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;

use crate::transport::{ConnectionState, OutboundEvent, Transport, TransportError};

/// In-process transport: emitted events land on a channel instead of a socket.
pub struct ChannelTransport {
    sender: mpsc::UnboundedSender<OutboundEvent>,
    connected: AtomicBool,
}

impl ChannelTransport {
    /// Creates a connected transport and the receiver its emitted events go to.
    pub fn pair() -> (Self, mpsc::UnboundedReceiver<OutboundEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                sender,
                connected: AtomicBool::new(true),
            },
            receiver,
        )
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn emit(&self, event: OutboundEvent) -> Result<(), TransportError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(TransportError::Disconnected);
        }
        debug!("Emitting {} over channel", event.name());
        self.sender.send(event).map_err(|_| {
            self.connected.store(false, Ordering::SeqCst);
            TransportError::Disconnected
        })
    }

    fn state(&self) -> ConnectionState {
        if self.connected.load(Ordering::SeqCst) {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }
}
