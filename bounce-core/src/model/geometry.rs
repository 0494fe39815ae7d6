use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Sample type of a raster channel. Only `U8` can be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelDepth {
    U8,
    U16,
    F32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameShape {
    pub height: i32,
    pub width: i32,
    pub channels: i32,
}

/// Colour in blue, green, red channel order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bgr(pub [u8; 3]);

impl Bgr {
    pub const RED: Bgr = Bgr([0, 0, 255]);
}

/// Raw, unvalidated description of the scene the server animates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    pub shape: FrameShape,
    pub depth: PixelDepth,
    pub position: (i32, i32),
    pub velocity: (i32, i32),
    pub radius: i32,
    pub color: [i32; 3],
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            shape: FrameShape {
                height: 480,
                width: 640,
                channels: 3,
            },
            depth: PixelDepth::U8,
            position: (100, 100),
            velocity: (2, 2),
            radius: 20,
            color: [0, 0, 255],
        }
    }
}

impl GeometryConfig {
    /// Validates the config and returns the initial state and ball colour.
    pub fn build(&self) -> Result<(GeometryState, Bgr)> {
        let FrameShape {
            height,
            width,
            channels,
        } = self.shape;

        if height <= 0 || width <= 0 {
            return Err(invalid(format!("bounds must be positive, got {height}x{width}")));
        }
        if channels != 3 {
            return Err(invalid(format!("expected 3 channels, got {channels}")));
        }
        if self.depth != PixelDepth::U8 {
            return Err(invalid(format!("pixel depth must be u8, got {:?}", self.depth)));
        }
        if self.radius <= 0 || i64::from(self.radius) * 2 >= i64::from(height.min(width)) {
            return Err(invalid(format!(
                "radius {} must be in (0, {})",
                self.radius,
                height.min(width) / 2
            )));
        }
        if self.velocity.0 == 0 || self.velocity.1 == 0 {
            return Err(invalid(format!(
                "velocity {:?} has a zero component",
                self.velocity
            )));
        }
        if self.velocity.0 == i32::MIN || self.velocity.1 == i32::MIN {
            return Err(invalid(format!(
                "velocity {:?} cannot be reflected",
                self.velocity
            )));
        }

        let (x, y) = self.position;
        let r = self.radius;
        if x < r || x > width - r || y < r || y > height - r {
            return Err(invalid(format!(
                "position {:?} is outside [{r}, {}]x[{r}, {}]",
                self.position,
                width - r,
                height - r
            )));
        }

        let mut color = [0u8; 3];
        for (slot, &channel) in color.iter_mut().zip(self.color.iter()) {
            *slot = u8::try_from(channel)
                .map_err(|_| invalid(format!("colour channel {channel} is outside [0, 255]")))?;
        }

        let state = GeometryState {
            position: self.position,
            velocity: self.velocity,
            radius: self.radius,
            bounds: (height, width),
        };
        Ok((state, Bgr(color)))
    }
}

fn invalid(reason: String) -> Error {
    Error::InvalidGeometryConfig(reason)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometryState {
    /// Ball centre as `(x, y)`.
    pub position: (i32, i32),
    pub velocity: (i32, i32),
    pub radius: i32,
    /// Raster bounds as `(height, width)`.
    pub bounds: (i32, i32),
}

impl GeometryState {
    pub fn advance(&self) -> Self {
        advance(self)
    }

    pub fn height(&self) -> i32 {
        self.bounds.0
    }

    pub fn width(&self) -> i32 {
        self.bounds.1
    }
}

/// Moves the ball one tick and reflects it off the raster edges.
///
/// Each axis is handled independently: once the centre touches or crosses
/// `radius` or `bound - radius` it is placed on that boundary and the
/// velocity on that axis is negated.
pub fn advance(state: &GeometryState) -> GeometryState {
    let (x, vx) = step_axis(state.position.0, state.velocity.0, state.radius, state.width());
    let (y, vy) = step_axis(state.position.1, state.velocity.1, state.radius, state.height());

    GeometryState {
        position: (x, y),
        velocity: (vx, vy),
        ..*state
    }
}

fn step_axis(pos: i32, vel: i32, radius: i32, bound: i32) -> (i32, i32) {
    let low = i64::from(radius);
    let high = i64::from(bound) - low;
    let next = i64::from(pos) + i64::from(vel);

    // `next` lies strictly between `low` and `high` in the last arm, so it
    // fits back into an i32.
    if next >= high {
        (high as i32, vel.saturating_neg())
    } else if next <= low {
        (low as i32, vel.saturating_neg())
    } else {
        (next as i32, vel)
    }
}
