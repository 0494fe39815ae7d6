use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Rejected at construction time, before any session starts.
    #[error("invalid geometry config: {0}")]
    InvalidGeometryConfig(String),

    /// The thresholded frame has no foreground pixels.
    #[error("invalid media config: {0}")]
    InvalidMediaConfig(String),

    #[error("degenerate mask: no pixel above the intensity threshold")]
    DegenerateMask,

    #[error("malformed centroid message: {0:?}")]
    MalformedCentroidMessage(String),

    #[error("invalid frame: expected {expected} bytes for {height}x{width}x3, got {actual}")]
    InvalidFrame {
        height: usize,
        width: usize,
        expected: usize,
        actual: usize,
    },
}
