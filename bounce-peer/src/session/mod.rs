mod data_channel;
mod session_peer;
mod session_state;

pub use data_channel::DataChannelHandle;
pub use session_peer::SessionPeer;
pub use session_state::{LifecycleAction, LifecycleEvent, SessionLifecycle, SessionState};
