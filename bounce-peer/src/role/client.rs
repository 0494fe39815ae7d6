use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, warn};

use bounce_core::Frame;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::media::{FrameSink, relay_channel};
use crate::role::{SessionEnd, serve};
use crate::session::SessionPeer;
use crate::signaling::{SignalingLoop, SignalingTransport};
use crate::tracking::{CentroidSlot, LocatorStats, LocatorWorker, Mailbox};

/// Frames waiting to be relayed before new ones are dropped.
const RELAY_QUEUE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientReport {
    pub end: SessionEnd,
    pub frames: u64,
    pub centroids_sent: u64,
    pub locator: LocatorStats,
}

/// Receives the ball video, locates the ball in the background and reports
/// the latest position over the data channel.
pub struct TrackingClient {
    config: ClientConfig,
    sink: Box<dyn FrameSink>,
}

#[derive(Default)]
struct Counters {
    frames: AtomicU64,
    sent: AtomicU64,
}

impl TrackingClient {
    pub fn new(config: ClientConfig, sink: Box<dyn FrameSink>) -> Self {
        Self { config, sink }
    }

    /// Answers the remote offer over `transport` and runs until the server
    /// says bye, signaling faults, or `shutdown` resolves.
    pub async fn run<T, S>(self, transport: T, shutdown: S) -> Result<ClientReport>
    where
        T: SignalingTransport,
        S: Future<Output = ()>,
    {
        let config = self.config;
        let sink = Arc::new(Mutex::new(self.sink));

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let peer = SessionPeer::new(
            "client",
            &config.transport,
            config.media.clone(),
            outbound_tx,
        )
        .await?;

        let mailbox = Mailbox::new();
        let slot = CentroidSlot::new();
        let locator = LocatorWorker::spawn(mailbox.clone(), slot.clone());

        let relay = if config.relay {
            let (sender, producer) = relay_channel(RELAY_QUEUE);
            peer.add_outbound_video_producer(Box::new(producer)).await?;
            Some(sender)
        } else {
            None
        };

        let counters = Arc::new(Counters::default());
        peer.on_inbound_track({
            let peer = peer.clone();
            let sink = Arc::clone(&sink);
            let counters = Arc::clone(&counters);
            move |frame: Frame| {
                let peer = peer.clone();
                let sink = Arc::clone(&sink);
                let counters = Arc::clone(&counters);
                let relay = relay.clone();
                let mailbox = mailbox.clone();
                let slot = slot.clone();
                async move {
                    counters.frames.fetch_add(1, Ordering::Relaxed);

                    if let Err(e) = sink.lock().await.write(&frame).await {
                        warn!("Recording failed: {}", e);
                    }
                    if let Some(relay) = &relay {
                        relay.push(frame.clone());
                    }
                    mailbox.put(frame);

                    let (Some(centroid), Some(channel)) = (slot.load(), peer.data_channel()) else {
                        return;
                    };
                    match channel.send_text(centroid.to_string()).await {
                        Ok(()) => {
                            counters.sent.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(e) => debug!("Centroid not sent: {}", e),
                    }
                }
            }
        });

        let mut signaling = SignalingLoop::new(transport, peer.clone(), outbound_rx);
        let end = serve(&mut signaling, shutdown).await;

        peer.stop_media();
        if let Err(e) = sink.lock().await.close().await {
            warn!("Closing recorder: {}", e);
        }
        if let Err(e) = signaling.close().await {
            warn!("Closing signaling: {}", e);
        }
        peer.close().await?;
        let locator = locator.stop().await;
        info!("Shutdown complete");

        Ok(ClientReport {
            end: end?,
            frames: counters.frames.load(Ordering::Relaxed),
            centroids_sent: counters.sent.load(Ordering::Relaxed),
            locator,
        })
    }
}
