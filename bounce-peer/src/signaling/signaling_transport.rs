use async_trait::async_trait;

use bounce_core::Signal;

use crate::error::Result;

/// A reliable, ordered pipe for signaling messages.
#[async_trait]
pub trait SignalingTransport: Send {
    /// Establishes the pipe. Called once, before anything else.
    async fn connect(&mut self) -> Result<()>;

    async fn send(&mut self, signal: &Signal) -> Result<()>;

    /// Waits for the next message. Must be cancel safe: the signaling loop
    /// races it against the outbound queue.
    async fn receive(&mut self) -> Result<Signal>;

    /// Says goodbye to the remote (if connected) and releases the pipe.
    /// Calling it again is a no-op.
    async fn close(&mut self) -> Result<()>;
}

