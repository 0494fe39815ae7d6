use thiserror::Error;

pub type Result<T, E = PeerError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum PeerError {
    /// The transport reported `failed`; the session is closed, never retried.
    #[error("session failure: {0}")]
    SessionFailure(String),

    /// Anything that went wrong while processing a signaling message.
    #[error("signaling loop fault: {0}")]
    SignalingLoopFault(String),

    #[error("signaling transport: {0}")]
    Signaling(String),

    #[error("data channel: {0}")]
    DataChannel(String),

    #[error("codec: {0}")]
    Codec(String),

    #[error("recorder: {0}")]
    Recorder(String),

    #[error(transparent)]
    Core(#[from] bounce_core::Error),

    #[error(transparent)]
    Webrtc(#[from] webrtc::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl PeerError {
    pub(crate) fn into_loop_fault(self) -> Self {
        match self {
            PeerError::SignalingLoopFault(_) => self,
            other => PeerError::SignalingLoopFault(other.to_string()),
        }
    }
}
