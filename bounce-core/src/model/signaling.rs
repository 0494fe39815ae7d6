use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdpKind {
    Offer,
    Answer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDescription {
    pub kind: SdpKind,
    pub sdp: String,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpKind::Offer,
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpKind::Answer,
            sdp: sdp.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IceCandidate {
    /// Full `candidate:...` attribute line.
    pub candidate: String,
    pub sdp_mid: Option<String>,
    pub sdp_mline_index: Option<u16>,
}

/// Everything that travels over the signaling pipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "WireSignal", from = "WireSignal")]
pub enum Signal {
    Description(SessionDescription),
    Candidate(IceCandidate),
    Bye,
}

impl Signal {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

/// One JSON object per message, `type`-tagged.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum WireSignal {
    Offer {
        sdp: String,
    },
    Answer {
        sdp: String,
    },
    Candidate {
        candidate: String,
        id: Option<String>,
        label: Option<u16>,
    },
    Bye,
}

impl From<Signal> for WireSignal {
    fn from(signal: Signal) -> Self {
        match signal {
            Signal::Description(SessionDescription {
                kind: SdpKind::Offer,
                sdp,
            }) => WireSignal::Offer { sdp },
            Signal::Description(SessionDescription {
                kind: SdpKind::Answer,
                sdp,
            }) => WireSignal::Answer { sdp },
            Signal::Candidate(c) => WireSignal::Candidate {
                candidate: c.candidate,
                id: c.sdp_mid,
                label: c.sdp_mline_index,
            },
            Signal::Bye => WireSignal::Bye,
        }
    }
}

impl From<WireSignal> for Signal {
    fn from(wire: WireSignal) -> Self {
        match wire {
            WireSignal::Offer { sdp } => Signal::Description(SessionDescription::offer(sdp)),
            WireSignal::Answer { sdp } => Signal::Description(SessionDescription::answer(sdp)),
            WireSignal::Candidate {
                candidate,
                id,
                label,
            } => Signal::Candidate(IceCandidate {
                candidate,
                sdp_mid: id,
                sdp_mline_index: label,
            }),
            WireSignal::Bye => Signal::Bye,
        }
    }
}
