use tokio::sync::mpsc;
use tracing::{debug, info};

use bounce_core::{SdpKind, Signal};

use crate::error::{PeerError, Result};
use crate::session::SessionPeer;
use crate::signaling::signaling_transport::SignalingTransport;

/// Why the loop ended without a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// The remote said goodbye.
    Bye,
}

/// Moves signals between a transport and a session until the remote leaves.
pub struct SignalingLoop<T> {
    transport: T,
    peer: SessionPeer,
    outbound: mpsc::UnboundedReceiver<Signal>,
}

impl<T: SignalingTransport> SignalingLoop<T> {
    /// `outbound` is the receiving end of the queue the session was built with.
    pub fn new(transport: T, peer: SessionPeer, outbound: mpsc::UnboundedReceiver<Signal>) -> Self {
        Self {
            transport,
            peer,
            outbound,
        }
    }

    /// Connects the transport and serves it. Every error ends the loop as a
    /// [`PeerError::SignalingLoopFault`].
    pub async fn run(&mut self) -> Result<LoopExit> {
        self.transport
            .connect()
            .await
            .map_err(PeerError::into_loop_fault)?;

        loop {
            tokio::select! {
                received = self.transport.receive() => {
                    let signal = received.map_err(PeerError::into_loop_fault)?;
                    if let Some(exit) = self.dispatch(signal).await.map_err(PeerError::into_loop_fault)? {
                        return Ok(exit);
                    }
                }
                Some(signal) = self.outbound.recv() => {
                    self.transport
                        .send(&signal)
                        .await
                        .map_err(PeerError::into_loop_fault)?;
                }
            }
        }
    }

    async fn dispatch(&mut self, signal: Signal) -> Result<Option<LoopExit>> {
        match signal {
            Signal::Description(description) => {
                let kind = description.kind;
                debug!("Remote {:?} received", kind);
                self.peer.set_remote_description(description).await?;

                if kind == SdpKind::Offer {
                    let answer = self.peer.create_answer().await?;
                    self.peer.set_local_description(answer).await?;
                }
            }
            Signal::Candidate(candidate) => self.peer.add_ice_candidate(candidate).await?,
            Signal::Bye => {
                info!("Remote said bye");
                return Ok(Some(LoopExit::Bye));
            }
        }
        Ok(None)
    }

    /// Sends everything still queued, then closes the transport.
    pub async fn close(&mut self) -> Result<()> {
        while let Ok(signal) = self.outbound.try_recv() {
            if self.transport.send(&signal).await.is_err() {
                break;
            }
        }
        self.transport.close().await
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}
