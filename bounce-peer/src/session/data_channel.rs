use std::sync::Arc;

use webrtc::data_channel::RTCDataChannel;
use webrtc::data_channel::data_channel_state::RTCDataChannelState;

use crate::error::{PeerError, Result};

/// Cheap, cloneable sending side of a text data channel.
#[derive(Clone)]
pub struct DataChannelHandle {
    channel: Arc<RTCDataChannel>,
}

impl DataChannelHandle {
    pub(crate) fn new(channel: Arc<RTCDataChannel>) -> Self {
        Self { channel }
    }

    pub fn label(&self) -> &str {
        self.channel.label()
    }

    pub fn is_open(&self) -> bool {
        self.channel.ready_state() == RTCDataChannelState::Open
    }

    /// Sends one UTF-8 message. Fails if the channel is not open yet.
    pub async fn send_text(&self, text: impl Into<String>) -> Result<()> {
        if !self.is_open() {
            return Err(PeerError::DataChannel(format!(
                "'{}' is {}",
                self.label(),
                self.channel.ready_state()
            )));
        }
        self.channel.send_text(text.into()).await?;
        Ok(())
    }
}

impl std::fmt::Debug for DataChannelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataChannelHandle")
            .field("label", &self.label())
            .field("state", &self.channel.ready_state())
            .finish()
    }
}
