use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use bounce_core::Centroid;

#[derive(Debug, Default)]
struct Shared {
    packed: AtomicU64,
    /// Set by the first store and never cleared.
    filled: AtomicBool,
}

/// Most recent centroid, shared between the locator and the frame handler.
///
/// Both coordinates live in one word, so a reader never sees `x` from one
/// frame and `y` from another.
#[derive(Debug, Clone, Default)]
pub struct CentroidSlot {
    shared: Arc<Shared>,
}

impl CentroidSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self, centroid: Centroid) {
        let packed = (u64::from(centroid.x) << 32) | u64::from(centroid.y);
        self.shared.packed.store(packed, Ordering::Release);
        self.shared.filled.store(true, Ordering::Release);
    }

    pub fn load(&self) -> Option<Centroid> {
        if !self.shared.filled.load(Ordering::Acquire) {
            return None;
        }
        let packed = self.shared.packed.load(Ordering::Acquire);
        Some(Centroid::new((packed >> 32) as u32, packed as u32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        assert_eq!(CentroidSlot::new().load(), None);
    }

    #[test]
    fn latest_value_wins_across_clones() {
        let slot = CentroidSlot::new();
        let reader = slot.clone();

        slot.store(Centroid::new(1, 2));
        slot.store(Centroid::new(640, 480));

        assert_eq!(reader.load(), Some(Centroid::new(640, 480)));
    }

    #[test]
    fn extreme_coordinates_are_stored() {
        let slot = CentroidSlot::new();
        slot.store(Centroid::new(u32::MAX, u32::MAX));
        assert_eq!(slot.load(), Some(Centroid::new(u32::MAX, u32::MAX)));
    }

    #[test]
    fn zero_is_not_empty() {
        let slot = CentroidSlot::new();
        slot.store(Centroid::new(0, 0));
        assert_eq!(slot.load(), Some(Centroid::new(0, 0)));
    }
}
