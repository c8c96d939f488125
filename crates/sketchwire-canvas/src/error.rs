//! Error types for the canvas layer.

/// Errors that can occur while handling local drawing input.
///
/// Remote draw messages never fail: anything odd about them (an UP with no
/// stroke, a coordinate out of range) is repaired, not rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CanvasError {
    /// Local input arrived before the canvas was laid out, so device
    /// pixels cannot be turned into canvas fractions.
    #[error("canvas has no size yet")]
    EmptyCanvas,

    /// A canvas size with a zero, negative, or non-finite side.
    #[error("invalid canvas size {width}x{height}")]
    InvalidSize { width: f32, height: f32 },
}
