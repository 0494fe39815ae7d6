//! Pure building blocks of the bouncing-ball tracker: geometry, frame
//! synthesis, centroid location and the signaling data model.
//!
//! Nothing here touches the network or an async runtime.

pub mod clock;
mod error;
pub mod model;
pub mod vision;

pub use clock::FrameClock;
pub use error::{Error, Result};
pub use model::{
    Bgr, Centroid, Frame, FrameShape, GeometryConfig, GeometryState, IceCandidate, PixelDepth,
    SdpKind, SessionDescription, Signal, TimeBase, advance, render,
};
pub use vision::locate;
