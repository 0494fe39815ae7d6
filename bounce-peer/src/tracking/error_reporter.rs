use tokio::sync::watch;
use tracing::{info, warn};

use bounce_core::Centroid;

use crate::error::Result;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ErrorStats {
    pub reports: u64,
    pub malformed: u64,
    pub mean: f64,
    pub max: f64,
}

/// Compares centroid reports from the client against the ball position.
///
/// Reports are compared with the position at the time they arrive, not the
/// one the reported frame was rendered at, so network and locator latency
/// show up as error.
pub struct ErrorReporter {
    position: watch::Receiver<(i32, i32)>,
    stats: ErrorStats,
}

impl ErrorReporter {
    pub fn new(position: watch::Receiver<(i32, i32)>) -> Self {
        Self {
            position,
            stats: ErrorStats::default(),
        }
    }

    /// Handles one data channel message and returns the distance error.
    ///
    /// Malformed messages are counted and returned as errors; the reporter
    /// stays usable.
    pub fn report(&mut self, text: &str) -> Result<f64> {
        let centroid = match text.parse::<Centroid>() {
            Ok(centroid) => centroid,
            Err(e) => {
                warn!("Ignoring message: {}", e);
                self.stats.malformed += 1;
                return Err(e.into());
            }
        };

        let truth = *self.position.borrow();
        let distance = centroid.distance_to(truth);
        info!("Distance error: {:.3}", distance);

        let stats = &mut self.stats;
        stats.reports += 1;
        stats.mean += (distance - stats.mean) / stats.reports as f64;
        stats.max = stats.max.max(distance);

        Ok(distance)
    }

    pub fn stats(&self) -> ErrorStats {
        self.stats
    }
}
