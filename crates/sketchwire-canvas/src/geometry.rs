//! Coordinate spaces.
//!
//! Two spaces exist and they never mix:
//!
//! - [`NormalizedPoint`]: fractions of the canvas extent, each axis in
//!   `[0, 1]`. Everything stored or sent over the wire is normalized.
//! - [`DevicePoint`]: pixels on this device's canvas. Only pointer input
//!   and renderers deal in device points.
//!
//! [`CanvasSize`] converts between the two.

use crate::CanvasError;

/// The laid-out size of the local canvas, in device pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasSize {
    width: f32,
    height: f32,
}

impl CanvasSize {
    /// Builds a canvas size.
    ///
    /// # Errors
    /// [`CanvasError::InvalidSize`] unless both sides are finite and > 0.
    pub fn new(width: f32, height: f32) -> Result<Self, CanvasError> {
        let valid = |side: f32| side.is_finite() && side > 0.0;
        if valid(width) && valid(height) {
            Ok(Self { width, height })
        } else {
            Err(CanvasError::InvalidSize { width, height })
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }
}

/// A point in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DevicePoint {
    pub x: f32,
    pub y: f32,
}

impl DevicePoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance in pixels.
    pub fn distance(self, other: DevicePoint) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// A point as canvas fractions, each axis clamped to `[0, 1]`.
///
/// The fields are private so the clamp cannot be bypassed.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NormalizedPoint {
    x: f32,
    y: f32,
}

impl NormalizedPoint {
    /// Builds a normalized point, clamping each axis into `[0, 1]`.
    /// `NaN` becomes `0`.
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x: clamp_unit(x),
            y: clamp_unit(y),
        }
    }

    pub fn x(self) -> f32 {
        self.x
    }

    pub fn y(self) -> f32 {
        self.y
    }

    /// Converts a device pixel position on a canvas of `size`.
    pub fn from_device(point: DevicePoint, size: CanvasSize) -> Self {
        Self::new(point.x / size.width, point.y / size.height)
    }

    /// Converts back to device pixels on a canvas of `size`.
    pub fn to_device(self, size: CanvasSize) -> DevicePoint {
        DevicePoint::new(self.x * size.width, self.y * size.height)
    }

    /// The point halfway between `self` and `other`.
    pub fn midpoint(self, other: NormalizedPoint) -> NormalizedPoint {
        NormalizedPoint::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

fn clamp_unit(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}
