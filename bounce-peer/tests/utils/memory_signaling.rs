use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use bounce_core::Signal;
use bounce_peer::{PeerError, Result, SignalingTransport};

/// In-process signaling pipe; the two ends of [`memory_pair`] talk to each other.
pub struct MemorySignaling {
    tx: Option<mpsc::UnboundedSender<Signal>>,
    rx: mpsc::UnboundedReceiver<Signal>,
    /// Everything sent through this end (for verification).
    sent: Arc<Mutex<Vec<Signal>>>,
}

pub fn memory_pair() -> (MemorySignaling, MemorySignaling) {
    let (a_tx, b_rx) = mpsc::unbounded_channel();
    let (b_tx, a_rx) = mpsc::unbounded_channel();
    (MemorySignaling::new(a_tx, a_rx), MemorySignaling::new(b_tx, b_rx))
}

impl MemorySignaling {
    fn new(tx: mpsc::UnboundedSender<Signal>, rx: mpsc::UnboundedReceiver<Signal>) -> Self {
        Self {
            tx: Some(tx),
            rx,
            sent: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Handle to the log of sent signals that outlives the transport.
    pub fn sent_log(&self) -> Arc<Mutex<Vec<Signal>>> {
        Arc::clone(&self.sent)
    }
}

#[async_trait]
impl SignalingTransport for MemorySignaling {
    async fn connect(&mut self) -> Result<()> {
        Ok(())
    }

    async fn send(&mut self, signal: &Signal) -> Result<()> {
        tracing::debug!("[MemorySignaling] send {:?}", signal);
        self.sent.lock().unwrap().push(signal.clone());
        self.tx
            .as_ref()
            .ok_or_else(|| PeerError::Signaling("closed".into()))?
            .send(signal.clone())
            .map_err(|_| PeerError::Signaling("remote end dropped".into()))
    }

    async fn receive(&mut self) -> Result<Signal> {
        self.rx
            .recv()
            .await
            .ok_or_else(|| PeerError::Signaling("remote end dropped".into()))
    }

    async fn close(&mut self) -> Result<()> {
        if self.tx.is_some() {
            let _ = self.send(&Signal::Bye).await;
            self.tx = None;
        }
        Ok(())
    }
}
