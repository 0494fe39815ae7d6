mod centroid;
mod frame;
mod geometry;
mod signaling;

pub use centroid::Centroid;
pub use frame::{Frame, TimeBase, render};
pub use geometry::{Bgr, FrameShape, GeometryConfig, GeometryState, PixelDepth, advance};
pub use signaling::{IceCandidate, SdpKind, SessionDescription, Signal};
