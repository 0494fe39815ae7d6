//! WebRTC plumbing for the bouncing-ball tracker: the session wrapper, video
//! pipelines, centroid tracking, signaling and the two roles built on them.

pub mod config;
mod error;
pub mod media;
pub mod role;
pub mod session;
pub mod signaling;
pub mod tracking;

pub use config::{ClientConfig, MediaConfig, ServerConfig, TransportConfig};
pub use error::{PeerError, Result};
pub use role::{BallServer, ClientReport, ServerReport, SessionEnd, TrackingClient};
pub use session::{DataChannelHandle, SessionPeer, SessionState};
pub use signaling::{ConnectMode, Endpoint, LineSignaling, LoopExit, SignalingLoop, SignalingTransport};
