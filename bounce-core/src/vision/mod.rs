//! Ball localisation on a received frame.
//!
//! The frame is reduced to BT.601 luma, binarised at a fixed cutoff and the
//! centroid is taken from the raw image moments of the resulting mask.

use crate::error::{Error, Result};
use crate::model::{Centroid, Frame};

/// Pixels brighter than this are foreground.
pub const THRESHOLD: u8 = 50;

/// Raw moments of a binary mask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Moments {
    pub m00: u64,
    pub m10: u64,
    pub m01: u64,
}

impl Moments {
    pub fn of_mask(frame: &Frame, threshold: u8) -> Self {
        let mut moments = Moments::default();
        if frame.width() == 0 {
            return moments;
        }

        for (y, row) in frame
            .data()
            .chunks_exact(frame.width() * Frame::CHANNELS)
            .enumerate()
        {
            for (x, px) in row.chunks_exact(Frame::CHANNELS).enumerate() {
                if luma(px[0], px[1], px[2]) > threshold {
                    moments.m00 += 1;
                    moments.m10 += x as u64;
                    moments.m01 += y as u64;
                }
            }
        }

        moments
    }

    pub fn centroid(&self) -> Result<Centroid> {
        if self.m00 == 0 {
            return Err(Error::DegenerateMask);
        }
        Ok(Centroid {
            x: (self.m10 / self.m00) as u32,
            y: (self.m01 / self.m00) as u32,
        })
    }
}

/// BT.601 luma with 14-bit fixed-point weights.
pub fn luma(b: u8, g: u8, r: u8) -> u8 {
    const B: u32 = 1868;
    const G: u32 = 9617;
    const R: u32 = 4899;
    ((u32::from(b) * B + u32::from(g) * G + u32::from(r) * R + (1 << 13)) >> 14) as u8
}

/// Locates the ball centre; fails with [`Error::DegenerateMask`] on an empty mask.
pub fn locate(frame: &Frame) -> Result<Centroid> {
    Moments::of_mask(frame, THRESHOLD).centroid()
}
