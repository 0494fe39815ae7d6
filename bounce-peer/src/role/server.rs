use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::error::Result;
use crate::media::BallProducer;
use crate::role::{SessionEnd, serve};
use crate::session::SessionPeer;
use crate::signaling::{SignalingLoop, SignalingTransport};
use crate::tracking::{ErrorReporter, ErrorStats};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServerReport {
    pub end: SessionEnd,
    pub errors: ErrorStats,
}

/// Streams the bouncing ball and scores the centroids the client sends back.
pub struct BallServer {
    config: ServerConfig,
}

impl BallServer {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Offers the session over `transport` and runs until the client says bye,
    /// signaling faults, or `shutdown` resolves.
    pub async fn run<T, S>(self, transport: T, shutdown: S) -> Result<ServerReport>
    where
        T: SignalingTransport,
        S: Future<Output = ()>,
    {
        let config = self.config;
        let (state, color) = config.geometry.build()?;
        let clock = config.media.clock()?;

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let peer = SessionPeer::new(
            "server",
            &config.transport,
            config.media.clone(),
            outbound_tx,
        )
        .await?;

        let producer = BallProducer::new(state, color, clock);
        let reporter = Arc::new(Mutex::new(ErrorReporter::new(producer.position())));

        peer.add_outbound_data_channel(&config.data_channel_label)
            .await?;
        peer.on_inbound_data({
            let reporter = Arc::clone(&reporter);
            move |text| {
                let reporter = Arc::clone(&reporter);
                async move {
                    let mut reporter = reporter.lock().unwrap_or_else(|p| p.into_inner());
                    let _ = reporter.report(&text);
                }
            }
        });
        peer.add_outbound_video_producer(Box::new(producer)).await?;

        let offer = peer.create_offer().await?;
        peer.set_local_description(offer).await?;

        let mut signaling = SignalingLoop::new(transport, peer.clone(), outbound_rx);
        let end = serve(&mut signaling, shutdown).await;

        peer.stop_media();
        if let Err(e) = signaling.close().await {
            warn!("Closing signaling: {}", e);
        }
        peer.close().await?;

        let errors = reporter.lock().unwrap_or_else(|p| p.into_inner()).stats();
        info!(
            "{} reports, mean error {:.3}, max error {:.3}, {} malformed",
            errors.reports, errors.mean, errors.max, errors.malformed
        );
        info!("Shutdown complete");

        Ok(ServerReport { end: end?, errors })
    }
}
