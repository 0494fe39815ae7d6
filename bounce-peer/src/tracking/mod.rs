mod centroid_slot;
mod error_reporter;
mod locator_worker;

pub use centroid_slot::CentroidSlot;
pub use error_reporter::{ErrorReporter, ErrorStats};
pub use locator_worker::{LocatorStats, LocatorWorker, Mailbox};
