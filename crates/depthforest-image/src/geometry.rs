//! Pixel coordinates and depth-scaled offsets.

use std::fmt;

/// A pixel coordinate inside (or outside) a depth image.
///
/// Coordinates are signed so that offset probes may land outside the image;
/// depth lookups treat such probes as background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelInfo {
    /// Column.
    pub x: i64,
    /// Row.
    pub y: i64,
}

impl PixelInfo {
    /// Create a pixel coordinate.
    #[must_use]
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Apply `offset` scaled by the inverse of `depth`, rounding to the
    /// nearest pixel.
    ///
    /// `depth` must be strictly positive. Shifts that exceed the `i64` range
    /// saturate, so a tiny depth sends the probe far outside any image.
    #[must_use]
    pub fn offset_by(self, offset: Offset, depth: f64) -> Self {
        debug_assert!(depth > 0.0, "offset scaling requires positive depth");
        Self {
            x: self.x.saturating_add((offset.dx / depth).round() as i64),
            y: self.y.saturating_add((offset.dy / depth).round() as i64),
        }
    }
}

impl fmt::Display for PixelInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A two-dimensional probe offset in depth-normalized pixel units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Offset {
    /// Horizontal component.
    pub dx: f64,
    /// Vertical component.
    pub dy: f64,
}

impl Offset {
    /// Create an offset.
    #[must_use]
    pub fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }
}
