mod line_signaling;
mod signaling_loop;
mod signaling_transport;

pub use line_signaling::{ConnectMode, Endpoint, LineSignaling};
pub use signaling_loop::{LoopExit, SignalingLoop};
pub use signaling_transport::SignalingTransport;
