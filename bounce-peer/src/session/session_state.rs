use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;

/// Coarse lifecycle of a session as seen by the roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

impl SessionState {
    /// No further media will flow once a session is in one of these.
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Failed | SessionState::Closed)
    }
}

/// Inputs of the lifecycle machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// A local or remote description was applied.
    DescriptionApplied,
    TransportConnecting,
    TransportConnected,
    TransportDisconnected,
    TransportFailed,
    TransportClosed,
}

impl LifecycleEvent {
    pub fn from_transport(state: RTCPeerConnectionState) -> Option<Self> {
        match state {
            RTCPeerConnectionState::Connecting => Some(LifecycleEvent::TransportConnecting),
            RTCPeerConnectionState::Connected => Some(LifecycleEvent::TransportConnected),
            RTCPeerConnectionState::Disconnected => Some(LifecycleEvent::TransportDisconnected),
            RTCPeerConnectionState::Failed => Some(LifecycleEvent::TransportFailed),
            RTCPeerConnectionState::Closed => Some(LifecycleEvent::TransportClosed),
            RTCPeerConnectionState::Unspecified | RTCPeerConnectionState::New => None,
        }
    }
}

/// What the owner of the machine has to do after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
    None,
    /// Close the underlying connection. Emitted at most once per session.
    Close,
}

#[derive(Debug)]
pub struct SessionLifecycle {
    state: SessionState,
    close_requested: bool,
}

impl Default for SessionLifecycle {
    fn default() -> Self {
        Self {
            state: SessionState::New,
            close_requested: false,
        }
    }
}

impl SessionLifecycle {
    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn apply(&mut self, event: LifecycleEvent) -> LifecycleAction {
        use LifecycleEvent::*;
        use SessionState::*;

        match (self.state, event) {
            (New, DescriptionApplied | TransportConnecting) => self.state = Connecting,
            (New | Connecting | Disconnected, TransportConnected) => self.state = Connected,
            (Connected, TransportDisconnected) => self.state = Disconnected,
            (Connecting | Connected | Disconnected, TransportFailed) => {
                self.state = Failed;
                return self.request_close();
            }
            (Closed, _) => {}
            (_, TransportClosed) => self.state = Closed,
            _ => {}
        }

        LifecycleAction::None
    }

    /// Explicit close; `true` only for the first close of the session.
    pub fn begin_close(&mut self) -> bool {
        self.state = SessionState::Closed;
        self.request_close() == LifecycleAction::Close
    }

    fn request_close(&mut self) -> LifecycleAction {
        if std::mem::replace(&mut self.close_requested, true) {
            LifecycleAction::None
        } else {
            LifecycleAction::Close
        }
    }
}
