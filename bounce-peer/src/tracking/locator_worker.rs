use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use bounce_core::{Error as CoreError, Frame, locate};

use crate::tracking::centroid_slot::CentroidSlot;

/// Single-slot hand-off from the frame handler to the locator.
///
/// A newer frame replaces one that was not picked up yet; the replaced frame
/// is counted as dropped.
#[derive(Clone, Default)]
pub struct Mailbox {
    shared: Arc<MailboxShared>,
}

#[derive(Default)]
struct MailboxShared {
    slot: Mutex<Option<Frame>>,
    closed: Mutex<bool>,
    notify: Notify,
    dropped: AtomicU64,
}

impl Mailbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, frame: Frame) {
        if *lock(&self.shared.closed) {
            return;
        }
        if lock(&self.shared.slot).replace(frame).is_some() {
            self.shared.dropped.fetch_add(1, Ordering::Relaxed);
        }
        self.shared.notify.notify_one();
    }

    /// Waits for a frame; `None` once the mailbox is closed.
    pub async fn take(&self) -> Option<Frame> {
        loop {
            let notified = self.shared.notify.notified();
            if let Some(frame) = lock(&self.shared.slot).take() {
                return Some(frame);
            }
            if *lock(&self.shared.closed) {
                return None;
            }
            notified.await;
        }
    }

    pub fn close(&self) {
        *lock(&self.shared.closed) = true;
        self.shared.notify.notify_one();
    }

    pub fn dropped(&self) -> u64 {
        self.shared.dropped.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocatorStats {
    pub located: u64,
    pub degenerate: u64,
    pub dropped: u64,
}

/// Background task running [`locate`] on the most recent frame only.
pub struct LocatorWorker {
    handle: JoinHandle<LocatorStats>,
    mailbox: Mailbox,
}

impl LocatorWorker {
    pub fn spawn(mailbox: Mailbox, slot: CentroidSlot) -> Self {
        let handle = tokio::spawn(run(mailbox.clone(), slot));
        Self { handle, mailbox }
    }

    /// Closes the mailbox and waits for the in-flight frame.
    pub async fn stop(self) -> LocatorStats {
        self.mailbox.close();
        let stats = self.handle.await.unwrap_or_default();
        info!(
            "Locator stopped: {} located, {} without a ball, {} dropped",
            stats.located, stats.degenerate, stats.dropped
        );
        stats
    }
}

async fn run(mailbox: Mailbox, slot: CentroidSlot) -> LocatorStats {
    let mut stats = LocatorStats::default();

    while let Some(frame) = mailbox.take().await {
        match tokio::task::spawn_blocking(move || locate(&frame)).await {
            Ok(Ok(centroid)) => {
                debug!("Located ball at {}", centroid);
                slot.store(centroid);
                stats.located += 1;
            }
            Ok(Err(CoreError::DegenerateMask)) => {
                warn!("No ball in frame");
                stats.degenerate += 1;
            }
            Ok(Err(e)) => warn!("Locator: {}", e),
            Err(e) => warn!("Locator task panicked: {}", e),
        }
    }

    stats.dropped = mailbox.dropped();
    stats
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
