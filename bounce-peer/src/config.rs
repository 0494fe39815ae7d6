use bounce_core::{FrameClock, GeometryConfig};

use crate::error::Result;

/// Configuration for the WebRTC transport.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub ice_servers: Vec<String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec!["stun:stun.l.google.com:19302".to_owned()],
        }
    }
}

impl TransportConfig {
    /// Host candidates only; enough for peers on one machine or LAN.
    pub fn local() -> Self {
        Self {
            ice_servers: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MediaConfig {
    pub fps: u32,
    pub clock_rate: u32,
    /// Force an IDR frame every this many frames; 0 disables.
    pub keyframe_interval: u64,
}

impl MediaConfig {
    /// The pts clock for this config; rejects rates the clock cannot tick at.
    pub fn clock(&self) -> Result<FrameClock> {
        Ok(FrameClock::new(self.clock_rate, self.fps)?)
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            fps: 30,
            clock_rate: 90_000,
            keyframe_interval: 30,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub geometry: GeometryConfig,
    pub transport: TransportConfig,
    pub media: MediaConfig,
    pub data_channel_label: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            geometry: GeometryConfig::default(),
            transport: TransportConfig::default(),
            media: MediaConfig::default(),
            data_channel_label: "chat".to_owned(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub transport: TransportConfig,
    pub media: MediaConfig,
    /// Send the received stream back to the server.
    pub relay: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            transport: TransportConfig::default(),
            media: MediaConfig::default(),
            relay: true,
        }
    }
}
