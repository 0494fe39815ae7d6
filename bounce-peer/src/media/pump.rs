use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, info, warn};
use webrtc::media::Sample;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

use crate::error::Result;
use crate::media::codec::EncoderWorker;
use crate::media::producer::VideoProducer;

/// Pulls frames from a producer, encodes them and writes them to a track.
pub struct OutboundPump {
    pub track: Arc<TrackLocalStaticSample>,
    pub encoder: EncoderWorker,
    /// Force an IDR frame every this many frames; 0 disables.
    pub keyframe_interval: u64,
    /// Set by the RTCP reader when the remote asks for a picture.
    pub keyframe_request: Arc<AtomicBool>,
    /// Sample duration used until two timestamps are known.
    pub frame_interval: Duration,
}

impl OutboundPump {
    /// Runs until the producer ends. Returns the number of frames written.
    pub async fn run(self, mut producer: Box<dyn VideoProducer>) -> Result<u64> {
        let mut written = 0u64;
        let mut last_pts = None;

        while let Some(frame) = producer.next_frame().await {
            let duration = match last_pts {
                Some(prev) if frame.pts() > prev => {
                    Duration::from_secs_f64(frame.time_base().seconds(frame.pts() - prev))
                }
                _ => self.frame_interval,
            };
            last_pts = Some(frame.pts());

            let periodic = self.keyframe_interval > 0 && written % self.keyframe_interval == 0;
            let requested = self.keyframe_request.swap(false, Ordering::AcqRel);
            if requested {
                debug!("Keyframe requested by remote");
            }

            let encoded = match self.encoder.encode(frame, periodic || requested).await {
                Ok(encoded) => encoded,
                Err(e) => {
                    warn!("Skipping frame: {}", e);
                    continue;
                }
            };

            self.track
                .write_sample(&Sample {
                    data: encoded.data,
                    duration,
                    ..Default::default()
                })
                .await?;
            written += 1;
        }

        info!("Outbound video ended after {} frames", written);
        Ok(written)
    }
}
