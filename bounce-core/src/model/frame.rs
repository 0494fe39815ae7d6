use crate::error::{Error, Result};
use crate::model::geometry::{Bgr, GeometryState};

/// Rational unit of a presentation timestamp, e.g. `1/90000` seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeBase {
    pub num: u32,
    pub den: u32,
}

impl TimeBase {
    /// The 90 kHz RTP video clock.
    pub const VIDEO: TimeBase = TimeBase { num: 1, den: 90_000 };

    pub fn seconds(&self, pts: i64) -> f64 {
        pts as f64 * self.num as f64 / self.den as f64
    }
}

impl Default for TimeBase {
    fn default() -> Self {
        Self::VIDEO
    }
}

/// A packed BGR24 raster with its presentation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    height: usize,
    width: usize,
    data: Vec<u8>,
    pts: i64,
    time_base: TimeBase,
}

impl Frame {
    pub const CHANNELS: usize = 3;

    /// Wraps an existing buffer, which must hold exactly `height * width * 3` bytes.
    pub fn new(
        height: usize,
        width: usize,
        data: Vec<u8>,
        pts: i64,
        time_base: TimeBase,
    ) -> Result<Self> {
        let expected = height * width * Self::CHANNELS;
        if data.len() != expected {
            return Err(Error::InvalidFrame {
                height,
                width,
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            height,
            width,
            data,
            pts,
            time_base,
        })
    }

    pub fn black(height: usize, width: usize) -> Self {
        Self {
            height,
            width,
            data: vec![0; height * width * Self::CHANNELS],
            pts: 0,
            time_base: TimeBase::default(),
        }
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn pts(&self) -> i64 {
        self.pts
    }

    pub fn time_base(&self) -> TimeBase {
        self.time_base
    }

    /// Re-tags the frame; pixels are untouched.
    pub fn with_timing(mut self, pts: i64, time_base: TimeBase) -> Self {
        self.pts = pts;
        self.time_base = time_base;
        self
    }

    pub fn pixel(&self, x: usize, y: usize) -> Bgr {
        let i = (y * self.width + x) * Self::CHANNELS;
        Bgr([self.data[i], self.data[i + 1], self.data[i + 2]])
    }

    /// Fills the disk of `radius` around `(cx, cy)`, clipped to the raster.
    pub fn fill_disk(&mut self, (cx, cy): (i32, i32), radius: i32, color: Bgr) {
        let r2 = i64::from(radius) * i64::from(radius);
        let y0 = (cy - radius).max(0);
        let y1 = (cy + radius).min(self.height as i32 - 1);
        let x0 = (cx - radius).max(0);
        let x1 = (cx + radius).min(self.width as i32 - 1);

        for y in y0..=y1 {
            let dy = i64::from(y - cy);
            for x in x0..=x1 {
                let dx = i64::from(x - cx);
                if dx * dx + dy * dy <= r2 {
                    let i = (y as usize * self.width + x as usize) * Self::CHANNELS;
                    self.data[i..i + Self::CHANNELS].copy_from_slice(&color.0);
                }
            }
        }
    }
}

/// Draws the ball described by `state` on a fresh black raster.
pub fn render(state: &GeometryState, color: Bgr) -> Frame {
    let mut frame = Frame::black(state.height() as usize, state.width() as usize);
    frame.fill_disk(state.position, state.radius, color);
    frame
}
