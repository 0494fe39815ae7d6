pub mod counting_sink;
pub mod memory_signaling;

pub use counting_sink::*;
pub use memory_signaling::*;
