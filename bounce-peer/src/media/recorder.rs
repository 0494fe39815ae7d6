//! Where the client's received frames end up.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use muxide::api::{Metadata, Muxer, MuxerBuilder, VideoCodec};
use tracing::info;

use bounce_core::Frame;

use crate::error::{PeerError, Result};
use crate::media::codec::EncoderWorker;

#[async_trait]
pub trait FrameSink: Send {
    async fn write(&mut self, frame: &Frame) -> Result<()>;

    /// Flushes and releases the sink. Further writes are errors.
    async fn close(&mut self) -> Result<()>;
}

/// Accepts and discards every frame.
#[derive(Debug, Default)]
pub struct Blackhole {
    frames: u64,
}

#[async_trait]
impl FrameSink for Blackhole {
    async fn write(&mut self, _frame: &Frame) -> Result<()> {
        self.frames += 1;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        info!("Blackhole swallowed {} frames", self.frames);
        Ok(())
    }
}

enum Output {
    /// Created but waiting for the first frame to learn the picture size.
    Pending(File),
    Muxing {
        muxer: Muxer<BufWriter<File>>,
        first_pts: i64,
    },
    Closed,
}

/// Re-encodes frames to H.264 and muxes them into an MP4 file, keeping each
/// frame's presentation time.
pub struct Mp4FileSink {
    path: PathBuf,
    fps: f64,
    output: Output,
    encoder: EncoderWorker,
    frames: u64,
    duration_secs: f64,
}

impl Mp4FileSink {
    /// Creates (truncates) the file up front so a bad path fails at start-up.
    /// `fps` is the nominal rate written to the container header.
    pub async fn create(path: impl AsRef<Path>, fps: u32) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)
            .map_err(|e| PeerError::Recorder(format!("cannot create {}: {}", path.display(), e)))?;
        let encoder = EncoderWorker::spawn("recorder").await?;

        info!("Recording to {}", path.display());
        Ok(Self {
            path,
            fps: f64::from(fps),
            output: Output::Pending(file),
            encoder,
            frames: 0,
            duration_secs: 0.0,
        })
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Duration reported by the muxer once the sink is closed.
    pub fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    fn start_muxer(&self, file: File, frame: &Frame) -> Result<Muxer<BufWriter<File>>> {
        MuxerBuilder::new(BufWriter::new(file))
            .video(
                VideoCodec::H264,
                frame.width() as u32,
                frame.height() as u32,
                self.fps,
            )
            .with_fast_start(true)
            .with_metadata(Metadata::new().with_current_time())
            .build()
            .map_err(|e| PeerError::Recorder(format!("cannot start muxer: {}", e)))
    }
}

#[async_trait]
impl FrameSink for Mp4FileSink {
    async fn write(&mut self, frame: &Frame) -> Result<()> {
        if matches!(self.output, Output::Closed) {
            return Err(PeerError::Recorder(format!("{} is closed", self.path.display())));
        }

        let encoded = self.encoder.encode(frame.clone(), self.frames == 0).await?;

        let (mut muxer, first_pts) = match std::mem::replace(&mut self.output, Output::Closed) {
            Output::Pending(file) => (self.start_muxer(file, frame)?, frame.pts()),
            Output::Muxing { muxer, first_pts } => (muxer, first_pts),
            Output::Closed => {
                return Err(PeerError::Recorder(format!("{} is closed", self.path.display())));
            }
        };

        let pts = frame.time_base().seconds(frame.pts() - first_pts);
        let written = muxer.write_video(pts, &encoded.data, encoded.is_keyframe);
        self.output = Output::Muxing { muxer, first_pts };
        written
            .map_err(|e| PeerError::Recorder(format!("cannot write frame at {pts:.3}s: {}", e)))?;

        self.frames += 1;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.output, Output::Closed) {
            Output::Muxing { muxer, .. } => {
                let stats = muxer
                    .finish_with_stats()
                    .map_err(|e| PeerError::Recorder(format!("cannot finish recording: {}", e)))?;
                self.duration_secs = stats.duration_secs;
                info!(
                    "Wrote {} frames ({:.2}s) to {}",
                    self.frames,
                    stats.duration_secs,
                    self.path.display()
                );
            }
            Output::Pending(_) => info!("No frames recorded to {}", self.path.display()),
            Output::Closed => {}
        }
        Ok(())
    }
}
