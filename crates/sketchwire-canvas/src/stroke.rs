//! Strokes and the stroke log.
//!
//! A [`Stroke`] is one pen-down-to-pen-up gesture, stored as a list of
//! path segments in normalized coordinates. Strokes are built by a
//! [`StrokeBuilder`] and become immutable once committed to the
//! [`StrokeLog`].

use sketchwire_protocol::Color;

use crate::geometry::{CanvasSize, DevicePoint, NormalizedPoint};

// ---------------------------------------------------------------------------
// Style
// ---------------------------------------------------------------------------

/// Pen color and width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub color: Color,
    /// Pen width in device pixels.
    pub stroke_width: f32,
}

impl StrokeStyle {
    /// Width used when nothing else is configured.
    pub const DEFAULT_STROKE_WIDTH: f32 = 12.0;
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            stroke_width: Self::DEFAULT_STROKE_WIDTH,
        }
    }
}

// ---------------------------------------------------------------------------
// Path segments
// ---------------------------------------------------------------------------

/// One drawing instruction. Generic over the coordinate space so the same
/// shape serves storage (`NormalizedPoint`) and rendering (`DevicePoint`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment<P = NormalizedPoint> {
    /// Lift the pen and place it at a point. Always the first segment.
    MoveTo(P),
    /// Quadratic Bézier from the current position.
    QuadTo { control: P, end: P },
    /// Straight line from the current position.
    LineTo(P),
}

impl<P: Copy> PathSegment<P> {
    /// The point the pen ends up at after this segment.
    pub fn end_point(&self) -> P {
        match self {
            Self::MoveTo(p) | Self::LineTo(p) => *p,
            Self::QuadTo { end, .. } => *end,
        }
    }

    /// Maps every point of the segment.
    pub fn map<Q>(self, mut f: impl FnMut(P) -> Q) -> PathSegment<Q> {
        match self {
            Self::MoveTo(p) => PathSegment::MoveTo(f(p)),
            Self::QuadTo { control, end } => PathSegment::QuadTo {
                control: f(control),
                end: f(end),
            },
            Self::LineTo(p) => PathSegment::LineTo(f(p)),
        }
    }
}

// ---------------------------------------------------------------------------
// Stroke
// ---------------------------------------------------------------------------

/// A committed (or in-progress) stroke.
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    style: StrokeStyle,
    segments: Vec<PathSegment>,
}

impl Stroke {
    pub fn style(&self) -> StrokeStyle {
        self.style
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// The end point of every segment, in drawing order.
    pub fn points(&self) -> impl Iterator<Item = NormalizedPoint> + '_ {
        self.segments.iter().map(PathSegment::end_point)
    }

    /// The path in device pixels, for a renderer.
    pub fn to_device(&self, size: CanvasSize) -> Vec<PathSegment<DevicePoint>> {
        self.segments
            .iter()
            .map(|s| s.map(|p| p.to_device(size)))
            .collect()
    }
}

/// A stroke under construction.
///
/// `cursor` is the last *accepted* input point. It lags the pen slightly:
/// each quad segment ends at the midpoint between the cursor and the new
/// point, which is what makes consecutive segments join smoothly.
#[derive(Debug, Clone)]
pub(crate) struct StrokeBuilder {
    stroke: Stroke,
    cursor: NormalizedPoint,
}

impl StrokeBuilder {
    pub(crate) fn start(at: NormalizedPoint, style: StrokeStyle) -> Self {
        Self {
            stroke: Stroke {
                style,
                segments: vec![PathSegment::MoveTo(at)],
            },
            cursor: at,
        }
    }

    pub(crate) fn cursor(&self) -> NormalizedPoint {
        self.cursor
    }

    pub(crate) fn stroke(&self) -> &Stroke {
        &self.stroke
    }

    /// Appends a smoothed segment toward `to` and moves the cursor there.
    pub(crate) fn quad_to(&mut self, to: NormalizedPoint) {
        self.stroke.segments.push(PathSegment::QuadTo {
            control: self.cursor,
            end: self.cursor.midpoint(to),
        });
        self.cursor = to;
    }

    /// Closes the path at the cursor.
    pub(crate) fn finish(mut self) -> Stroke {
        self.stroke.segments.push(PathSegment::LineTo(self.cursor));
        self.stroke
    }
}

// ---------------------------------------------------------------------------
// Stroke log
// ---------------------------------------------------------------------------

/// The committed strokes of one round, oldest first.
///
/// Append-only apart from [`StrokeLog::undo`], which removes exactly the
/// newest stroke. A stroke's identity is its index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrokeLog {
    strokes: Vec<Stroke>,
}

impl StrokeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, stroke: Stroke) {
        self.strokes.push(stroke);
    }

    /// Removes and returns the most recently committed stroke.
    pub fn undo(&mut self) -> Option<Stroke> {
        self.strokes.pop()
    }

    pub fn clear(&mut self) {
        self.strokes.clear();
    }

    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    pub fn as_slice(&self) -> &[Stroke] {
        &self.strokes
    }
}
