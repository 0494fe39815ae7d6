use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;

use bounce_core::Frame;
use bounce_peer::Result;
use bounce_peer::media::FrameSink;

/// Counts frames, and separately the ones that arrive after `close`.
#[derive(Debug, Default)]
pub struct SinkCounts {
    pub writes: AtomicU64,
    pub after_close: AtomicU64,
    pub closed: AtomicBool,
}

pub struct CountingSink {
    counts: Arc<SinkCounts>,
}

impl CountingSink {
    pub fn new() -> (Self, Arc<SinkCounts>) {
        let counts = Arc::new(SinkCounts::default());
        (
            Self {
                counts: Arc::clone(&counts),
            },
            counts,
        )
    }
}

#[async_trait]
impl FrameSink for CountingSink {
    async fn write(&mut self, _frame: &Frame) -> Result<()> {
        if self.counts.closed.load(Ordering::Acquire) {
            self.counts.after_close.fetch_add(1, Ordering::Relaxed);
        } else {
            self.counts.writes.fetch_add(1, Ordering::Relaxed);
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.counts.closed.store(true, Ordering::Release);
        Ok(())
    }
}
