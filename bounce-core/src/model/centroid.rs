use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Ball centre in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Centroid {
    pub x: u32,
    pub y: u32,
}

impl Centroid {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to an integer position.
    pub fn distance_to(&self, (x, y): (i32, i32)) -> f64 {
        let dx = f64::from(x) - f64::from(self.x);
        let dy = f64::from(y) - f64::from(self.y);
        dx.hypot(dy)
    }
}

/// Data channel wire format: `"<x> <y>"`.
impl fmt::Display for Centroid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.x, self.y)
    }
}

impl FromStr for Centroid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || Error::MalformedCentroidMessage(s.to_owned());

        let (x, y) = s.split_once(' ').ok_or_else(malformed)?;
        Ok(Self {
            x: parse_coordinate(x).ok_or_else(malformed)?,
            y: parse_coordinate(y).ok_or_else(malformed)?,
        })
    }
}

fn parse_coordinate(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
