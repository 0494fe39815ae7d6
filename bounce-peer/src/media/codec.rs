//! H.264 encode/decode on dedicated threads.
//!
//! openh264 handles live on the thread that created them; async callers talk
//! to them through a job channel and get the result back on a oneshot.

use std::sync::mpsc as std_mpsc;
use std::thread;

use bytes::Bytes;
use openh264::decoder::Decoder;
use openh264::encoder::{Encoder, FrameType};
use openh264::formats::{YUVBuffer, YUVSource};
use openh264::nal_units;
use tokio::sync::oneshot;
use tracing::debug;

use bounce_core::{Frame, TimeBase};

use crate::error::{PeerError, Result};

/// H.264 encoder fed with BGR frames.
pub struct H264Encoder {
    encoder: Encoder,
    frame_count: u64,
}

impl H264Encoder {
    pub fn new() -> Result<Self> {
        let encoder = Encoder::new()
            .map_err(|e| PeerError::Codec(format!("failed to create encoder: {e}")))?;
        Ok(Self {
            encoder,
            frame_count: 0,
        })
    }

    /// Encodes one frame into an Annex-B access unit.
    pub fn encode(&mut self, frame: &Frame, force_keyframe: bool) -> Result<EncodedFrame> {
        if frame.width() % 2 != 0 || frame.height() % 2 != 0 {
            return Err(PeerError::Codec(format!(
                "frame dimensions must be even, got {}x{}",
                frame.width(),
                frame.height()
            )));
        }

        if force_keyframe {
            self.encoder.force_intra_frame();
        }

        let yuv = YUVBuffer::from_vec(
            bgr_to_yuv420(frame.data(), frame.width(), frame.height()),
            frame.width(),
            frame.height(),
        );
        let bitstream = self
            .encoder
            .encode(&yuv)
            .map_err(|e| PeerError::Codec(format!("encoding failed: {e}")))?;

        let is_keyframe = matches!(bitstream.frame_type(), FrameType::IDR | FrameType::I);
        self.frame_count += 1;

        Ok(EncodedFrame {
            data: Bytes::from(bitstream.to_vec()),
            is_keyframe,
        })
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

#[derive(Debug, Clone)]
pub struct EncodedFrame {
    /// Annex-B NAL units with start codes.
    pub data: Bytes,
    pub is_keyframe: bool,
}

/// H.264 decoder producing BGR frames.
pub struct H264Decoder {
    decoder: Decoder,
}

impl H264Decoder {
    pub fn new() -> Result<Self> {
        let decoder = Decoder::new()
            .map_err(|e| PeerError::Codec(format!("failed to create decoder: {e}")))?;
        Ok(Self { decoder })
    }

    /// Decodes an Annex-B access unit. Returns `None` until a picture is complete.
    pub fn decode(&mut self, access_unit: &[u8]) -> Result<Option<Frame>> {
        let mut picture = None;

        for nal in nal_units(access_unit) {
            let decoded = self
                .decoder
                .decode(nal)
                .map_err(|e| PeerError::Codec(format!("decoding failed: {e}")))?;

            if let Some(yuv) = decoded {
                let (width, height) = yuv.dimensions();
                let mut rgb = vec![0u8; width * height * 3];
                yuv.write_rgb8(&mut rgb);
                picture = Some((height, width, rgb));
            }
        }

        let Some((height, width, mut data)) = picture else {
            return Ok(None);
        };
        for px in data.chunks_exact_mut(3) {
            px.swap(0, 2);
        }
        Ok(Some(Frame::new(height, width, data, 0, TimeBase::VIDEO)?))
    }
}

/// BT.601 BGR24 to planar I420.
fn bgr_to_yuv420(bgr: &[u8], width: usize, height: usize) -> Vec<u8> {
    let y_size = width * height;
    let uv_size = (width / 2) * (height / 2);
    let mut yuv = vec![0u8; y_size + uv_size * 2];

    let (y_plane, uv_planes) = yuv.split_at_mut(y_size);
    let (u_plane, v_plane) = uv_planes.split_at_mut(uv_size);

    for y in 0..height {
        for x in 0..width {
            let i = (y * width + x) * 3;
            let b = i32::from(bgr[i]);
            let g = i32::from(bgr[i + 1]);
            let r = i32::from(bgr[i + 2]);

            let y_val = ((66 * r + 129 * g + 25 * b + 128) >> 8) + 16;
            y_plane[y * width + x] = y_val.clamp(0, 255) as u8;

            if y % 2 == 0 && x % 2 == 0 {
                let uv = (y / 2) * (width / 2) + (x / 2);
                let u_val = ((-38 * r - 74 * g + 112 * b + 128) >> 8) + 128;
                let v_val = ((112 * r - 94 * g - 18 * b + 128) >> 8) + 128;
                u_plane[uv] = u_val.clamp(0, 255) as u8;
                v_plane[uv] = v_val.clamp(0, 255) as u8;
            }
        }
    }

    yuv
}

struct EncodeJob {
    frame: Frame,
    force_keyframe: bool,
    reply: oneshot::Sender<Result<EncodedFrame>>,
}

/// Handle to an encoder running on its own thread.
#[derive(Clone)]
pub struct EncoderWorker {
    jobs: std_mpsc::Sender<EncodeJob>,
}

impl EncoderWorker {
    pub async fn spawn(name: &str) -> Result<Self> {
        let (jobs, rx) = std_mpsc::channel::<EncodeJob>();
        let (ready_tx, ready_rx) = oneshot::channel();

        let thread_name = format!("h264-enc-{name}");
        thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || {
                let mut encoder = match H264Encoder::new() {
                    Ok(encoder) => {
                        let _ = ready_tx.send(Ok(()));
                        encoder
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                while let Ok(job) = rx.recv() {
                    let _ = job
                        .reply
                        .send(encoder.encode(&job.frame, job.force_keyframe));
                }
                debug!(
                    "{} stopped after {} frames",
                    thread_name,
                    encoder.frame_count()
                );
            })?;

        ready_rx
            .await
            .map_err(|_| PeerError::Codec("encoder thread died during start-up".into()))??;
        Ok(Self { jobs })
    }

    pub async fn encode(&self, frame: Frame, force_keyframe: bool) -> Result<EncodedFrame> {
        let (reply, result) = oneshot::channel();
        self.jobs
            .send(EncodeJob {
                frame,
                force_keyframe,
                reply,
            })
            .map_err(|_| PeerError::Codec("encoder thread is gone".into()))?;
        result
            .await
            .map_err(|_| PeerError::Codec("encoder thread dropped the job".into()))?
    }
}

struct DecodeJob {
    access_unit: Bytes,
    reply: oneshot::Sender<Result<Option<Frame>>>,
}

/// Handle to a decoder running on its own thread.
#[derive(Clone)]
pub struct DecoderWorker {
    jobs: std_mpsc::Sender<DecodeJob>,
}

impl DecoderWorker {
    pub async fn spawn(name: &str) -> Result<Self> {
        let (jobs, rx) = std_mpsc::channel::<DecodeJob>();
        let (ready_tx, ready_rx) = oneshot::channel();

        thread::Builder::new()
            .name(format!("h264-dec-{name}"))
            .spawn(move || {
                let mut decoder = match H264Decoder::new() {
                    Ok(decoder) => {
                        let _ = ready_tx.send(Ok(()));
                        decoder
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                while let Ok(job) = rx.recv() {
                    let _ = job.reply.send(decoder.decode(&job.access_unit));
                }
            })?;

        ready_rx
            .await
            .map_err(|_| PeerError::Codec("decoder thread died during start-up".into()))??;
        Ok(Self { jobs })
    }

    pub async fn decode(&self, access_unit: Bytes) -> Result<Option<Frame>> {
        let (reply, result) = oneshot::channel();
        self.jobs
            .send(DecodeJob { access_unit, reply })
            .map_err(|_| PeerError::Codec("decoder thread is gone".into()))?;
        result
            .await
            .map_err(|_| PeerError::Codec("decoder thread dropped the job".into()))?
    }
}
