//! Drawing path synchronizer for Sketchwire.
//!
//! Reconstructs one consistent drawing surface on every client out of a
//! stream of small delta events:
//!
//! - **Geometry** ([`CanvasSize`], [`DevicePoint`], [`NormalizedPoint`]):
//!   the two coordinate spaces and the conversion between them.
//! - **Strokes** ([`Stroke`], [`PathSegment`], [`StrokeLog`]): committed
//!   gestures, oldest first, with LIFO undo.
//! - **Synchronizer** ([`PathSynchronizer`]): applies remote draw points,
//!   draw actions, and history replays, and turns local pointer input into
//!   outbound draw messages.
//!
//! The crate does no I/O and owns no tasks. It is driven synchronously by
//! the client's dispatch loop.

mod error;
mod geometry;
mod stroke;
mod synchronizer;

pub use error::CanvasError;
pub use geometry::{CanvasSize, DevicePoint, NormalizedPoint};
pub use stroke::{PathSegment, Stroke, StrokeLog, StrokeStyle};
pub use synchronizer::{CanvasConfig, PathSynchronizer};
