use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, sleep_until};
use tracing::debug;

use bounce_core::{Bgr, Frame, FrameClock, GeometryState, advance, render};

/// Source of raw frames for an outbound video track.
#[async_trait]
pub trait VideoProducer: Send {
    /// Waits for the next frame; `None` ends the stream.
    async fn next_frame(&mut self) -> Option<Frame>;
}

/// Synthesizes the bouncing ball at the clock's frame rate.
///
/// Every produced frame publishes the ball position it was rendered at, so
/// an observer can compare reports against the ground truth.
pub struct BallProducer {
    state: GeometryState,
    color: Bgr,
    clock: FrameClock,
    started: Option<Instant>,
    position_tx: watch::Sender<(i32, i32)>,
}

impl BallProducer {
    pub fn new(state: GeometryState, color: Bgr, clock: FrameClock) -> Self {
        let (position_tx, _) = watch::channel(state.position);
        Self {
            state,
            color,
            clock,
            started: None,
            position_tx,
        }
    }

    /// Current ball position, updated once per produced frame.
    pub fn position(&self) -> watch::Receiver<(i32, i32)> {
        self.position_tx.subscribe()
    }
}

#[async_trait]
impl VideoProducer for BallProducer {
    async fn next_frame(&mut self) -> Option<Frame> {
        let started = *self.started.get_or_insert_with(Instant::now);
        sleep_until(started + self.clock.offset(self.clock.index())).await;

        self.state = advance(&self.state);
        let pts = self.clock.tick();
        let frame = render(&self.state, self.color).with_timing(pts, self.clock.time_base());

        self.position_tx.send_replace(self.state.position);
        Some(frame)
    }
}

/// Feeding side of a [`RelayProducer`]. Never blocks; frames are dropped when
/// the outbound pump falls behind.
#[derive(Clone)]
pub struct RelaySender {
    tx: mpsc::Sender<Frame>,
    dropped: Arc<AtomicU64>,
}

impl RelaySender {
    /// Returns `false` if the frame was dropped.
    pub fn push(&self, frame: Frame) -> bool {
        match self.tx.try_send(frame) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                debug!("Relay queue full, {} frames dropped so far", dropped);
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Replays frames received from elsewhere, keeping their timing.
pub struct RelayProducer {
    rx: mpsc::Receiver<Frame>,
}

#[async_trait]
impl VideoProducer for RelayProducer {
    async fn next_frame(&mut self) -> Option<Frame> {
        self.rx.recv().await
    }
}

pub fn relay_channel(capacity: usize) -> (RelaySender, RelayProducer) {
    let (tx, rx) = mpsc::channel(capacity);
    (
        RelaySender {
            tx,
            dropped: Arc::new(AtomicU64::new(0)),
        },
        RelayProducer { rx },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use bounce_core::{TimeBase, locate};
    use std::time::Duration;

    fn state() -> GeometryState {
        GeometryState {
            position: (100, 100),
            velocity: (2, 2),
            radius: 20,
            bounds: (480, 640),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn ball_frames_are_paced_and_stamped() {
        let mut producer = BallProducer::new(state(), Bgr::RED, FrameClock::default());
        let position = producer.position();
        let start = Instant::now();

        let first = producer.next_frame().await.unwrap();
        assert_eq!(first.pts(), 0);
        assert_eq!(first.time_base(), TimeBase::VIDEO);
        assert_eq!(*position.borrow(), (102, 102));

        let second = producer.next_frame().await.unwrap();
        assert_eq!(second.pts(), 3000);
        assert_eq!(*position.borrow(), (104, 104));
        assert!(start.elapsed() >= Duration::from_millis(33));

        let centroid = locate(&second).unwrap();
        assert_eq!((centroid.x, centroid.y), (104, 104));
    }

    #[tokio::test]
    async fn relay_drops_when_full() {
        let (sender, mut producer) = relay_channel(1);

        assert!(sender.push(Frame::black(2, 2).with_timing(7, TimeBase::VIDEO)));
        assert!(!sender.push(Frame::black(2, 2)));
        assert_eq!(sender.dropped(), 1);

        assert_eq!(producer.next_frame().await.unwrap().pts(), 7);
        drop(sender);
        assert!(producer.next_frame().await.is_none());
    }
}
