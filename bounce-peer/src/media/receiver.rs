use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::{debug, info, warn};
use webrtc::media::io::sample_builder::SampleBuilder;
use webrtc::rtp::codecs::h264::H264Packet;
use webrtc::track::track_remote::TrackRemote;

use bounce_core::{Frame, TimeBase};

use crate::media::codec::DecoderWorker;

/// Called once per decoded inbound frame.
pub type FrameHandler = Arc<dyn Fn(Frame) -> BoxFuture<'static, ()> + Send + Sync>;

/// Packets a sample may lag behind before it is given up on.
const MAX_LATE: u16 = 256;

/// Depacketizes and decodes an H.264 track until it ends.
pub async fn receive_video(track: Arc<TrackRemote>, decoder: DecoderWorker, handler: FrameHandler) {
    let mut builder = SampleBuilder::new(MAX_LATE, H264Packet::default(), TimeBase::VIDEO.den);
    let mut decoded = 0u64;

    loop {
        let packet = match track.read_rtp().await {
            Ok((packet, _)) => packet,
            Err(e) => {
                debug!("Inbound track {} ended: {}", track.ssrc(), e);
                break;
            }
        };
        builder.push(packet);

        while let Some(sample) = builder.pop() {
            match decoder.decode(sample.data).await {
                Ok(Some(frame)) => {
                    decoded += 1;
                    let pts = i64::from(sample.packet_timestamp);
                    handler(frame.with_timing(pts, TimeBase::VIDEO)).await;
                }
                Ok(None) => {}
                Err(e) => warn!("Dropping undecodable access unit: {}", e),
            }
        }
    }

    info!("Inbound video ended after {} frames", decoded);
}

/// Reads and discards a track so its buffers never back up.
pub async fn drain(track: Arc<TrackRemote>) {
    let mut packets = 0u64;
    while track.read_rtp().await.is_ok() {
        packets += 1;
    }
    info!("Drained {} packets from track {}", packets, track.ssrc());
}
