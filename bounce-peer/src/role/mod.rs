//! The two ends of the demo, wired from the building blocks.

mod client;
mod server;

use std::future::Future;

use tracing::{error, info};

use crate::error::Result;
use crate::signaling::{LoopExit, SignalingLoop, SignalingTransport};

pub use client::{ClientReport, TrackingClient};
pub use server::{BallServer, ServerReport};

/// How a role's session ended when it ended cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Interrupted,
    Bye,
}

/// Serves signaling until the remote leaves, the loop faults or `shutdown`
/// resolves.
async fn serve<T, S>(signaling: &mut SignalingLoop<T>, shutdown: S) -> Result<SessionEnd>
where
    T: SignalingTransport,
    S: Future<Output = ()>,
{
    tokio::select! {
        result = signaling.run() => match result {
            Ok(LoopExit::Bye) => Ok(SessionEnd::Bye),
            Err(e) => {
                error!("{}", e);
                Err(e)
            }
        },
        () = shutdown => {
            info!("Interrupted, shutting down");
            Ok(SessionEnd::Interrupted)
        }
    }
}
