//! Monotonic frame clock for presentation timestamps.

use std::time::Duration;

use crate::error::{Error, Result};
use crate::model::TimeBase;

/// Hands out `pts = index * ticks_per_frame` on a fixed time base.
///
/// The clock only counts; pacing against wall time is left to the caller,
/// which can use [`FrameClock::offset`] to find when a frame is due.
#[derive(Debug, Clone)]
pub struct FrameClock {
    clock_rate: u32,
    fps: u32,
    index: u64,
}

impl FrameClock {
    /// Fails if `fps` is zero or does not divide `clock_rate`.
    pub fn new(clock_rate: u32, fps: u32) -> Result<Self> {
        if fps == 0 || clock_rate % fps != 0 {
            return Err(Error::InvalidMediaConfig(format!(
                "{fps} fps does not divide the {clock_rate} Hz clock"
            )));
        }
        Ok(Self {
            clock_rate,
            fps,
            index: 0,
        })
    }

    pub fn time_base(&self) -> TimeBase {
        TimeBase {
            num: 1,
            den: self.clock_rate,
        }
    }

    pub fn ticks_per_frame(&self) -> u32 {
        self.clock_rate / self.fps
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs(1) / self.fps
    }

    /// Index of the next frame to be produced.
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Wall-clock offset from the first frame at which frame `index` is due.
    pub fn offset(&self, index: u64) -> Duration {
        Duration::from_nanos(index * 1_000_000_000 / u64::from(self.fps))
    }

    /// Returns the pts of the next frame and advances the clock.
    pub fn tick(&mut self) -> i64 {
        let pts = self.index as i64 * i64::from(self.ticks_per_frame());
        self.index += 1;
        pts
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self {
            clock_rate: 90_000,
            fps: 30,
            index: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pts_grows_by_one_frame_of_ticks() {
        let mut clock = FrameClock::default();

        assert_eq!(clock.tick(), 0);
        assert_eq!(clock.tick(), 3000);
        assert_eq!(clock.tick(), 6000);
        assert_eq!(clock.index(), 3);
        assert_eq!(clock.time_base(), TimeBase::VIDEO);
    }

    #[test]
    fn offsets_follow_the_frame_interval() {
        let clock = FrameClock::new(90_000, 30).unwrap();

        assert_eq!(clock.offset(0), Duration::ZERO);
        assert_eq!(clock.offset(30), Duration::from_secs(1));
    }

    #[test]
    fn rejects_rates_that_do_not_divide_the_clock() {
        assert!(matches!(
            FrameClock::new(90_000, 7),
            Err(Error::InvalidMediaConfig(_))
        ));
        assert!(matches!(
            FrameClock::new(90_000, 0),
            Err(Error::InvalidMediaConfig(_))
        ));
    }
}
