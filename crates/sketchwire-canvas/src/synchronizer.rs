//! The drawing path synchronizer.
//!
//! [`PathSynchronizer`] rebuilds the shared canvas from a stream of small
//! draw events. Remote events (from the drawing participant, via the
//! server) and local pointer input go through the same
//! [`PathSynchronizer::apply_draw_point`] path, so every client ends up
//! with the same strokes no matter who drew them.
//!
//! ```text
//! pointer (px) ─► local_pointer_event ─► normalize ─┐
//!                                                   ├─► apply_draw_point ─► strokes
//! server DrawPoint (fractions) ─────────────────────┘
//! ```
//!
//! # Smoothing
//!
//! A MOVE is only turned into a path segment when it lies more than
//! `smoothing_threshold_px` device pixels away from the last accepted
//! point. Accepted moves append a quadratic segment whose control point is
//! the last accepted point and whose end is the midpoint between the two.

use sketchwire_protocol::{
    Codec, DrawAction, DrawActionKind, DrawPoint, Message, RoundHistory,
    StrokePhase,
};
use tracing::{debug, trace, warn};

use crate::geometry::{CanvasSize, DevicePoint, NormalizedPoint};
use crate::stroke::{Stroke, StrokeBuilder, StrokeLog, StrokeStyle};
use crate::CanvasError;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for a [`PathSynchronizer`].
#[derive(Debug, Clone)]
pub struct CanvasConfig {
    /// Minimum pointer travel, in device pixels, before a MOVE extends the
    /// path. Default: 5.
    pub smoothing_threshold_px: f32,
    /// Pen the local participant starts with.
    pub initial_style: StrokeStyle,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            smoothing_threshold_px: 5.0,
            initial_style: StrokeStyle::default(),
        }
    }
}

impl CanvasConfig {
    /// Clamp any out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`PathSynchronizer::new`]. A negative or
    /// non-finite threshold becomes 0 (every move is accepted), and a
    /// non-positive pen width falls back to the default.
    pub fn validated(mut self) -> Self {
        if !self.smoothing_threshold_px.is_finite()
            || self.smoothing_threshold_px < 0.0
        {
            warn!(
                threshold = self.smoothing_threshold_px,
                "invalid smoothing threshold, using 0"
            );
            self.smoothing_threshold_px = 0.0;
        }
        let width = self.initial_style.stroke_width;
        if !width.is_finite() || width <= 0.0 {
            warn!(
                width = self.initial_style.stroke_width,
                "invalid stroke width, using default"
            );
            self.initial_style.stroke_width = StrokeStyle::DEFAULT_STROKE_WIDTH;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Synchronizer
// ---------------------------------------------------------------------------

/// Committed strokes plus the stroke currently being drawn.
#[derive(Debug)]
pub struct PathSynchronizer {
    config: CanvasConfig,
    room_name: String,
    size: Option<CanvasSize>,
    style: StrokeStyle,
    log: StrokeLog,
    current: Option<StrokeBuilder>,
    /// Whether `current` was started by local pointer input.
    local_stroke: bool,
}

impl PathSynchronizer {
    /// Creates an empty canvas for `room_name`. Outbound draw messages are
    /// stamped with that room name.
    pub fn new(room_name: impl Into<String>, config: CanvasConfig) -> Self {
        let config = config.validated();
        Self {
            style: config.initial_style,
            config,
            room_name: room_name.into(),
            size: None,
            log: StrokeLog::new(),
            current: None,
            local_stroke: false,
        }
    }

    // -- Remote & shared path -------------------------------------------

    /// Applies one draw event to the canvas.
    ///
    /// - DOWN starts a stroke at `(fromX, fromY)`, abandoning any stroke
    ///   that never received its UP.
    /// - MOVE extends the stroke toward `(toX, toY)`, subject to smoothing.
    /// - UP closes the stroke at the last accepted point and commits it.
    ///
    /// MOVE or UP without a stroke in progress starts one at `(toX, toY)`
    /// first, so a client that joined mid-gesture still draws the rest.
    pub fn apply_draw_point(&mut self, point: &DrawPoint) {
        let to = NormalizedPoint::new(point.to_x, point.to_y);
        let style = StrokeStyle {
            color: point.color,
            stroke_width: point.stroke_width,
        };

        match point.phase {
            StrokePhase::Down => {
                if self.current.is_some() {
                    debug!("stroke abandoned by a new DOWN");
                }
                let from = NormalizedPoint::new(point.from_x, point.from_y);
                self.current = Some(StrokeBuilder::start(from, style));
                self.local_stroke = false;
            }
            StrokePhase::Move => {
                let threshold = self.config.smoothing_threshold_px;
                let size = self.size;
                let builder = self.current.get_or_insert_with(|| {
                    trace!("MOVE without DOWN, starting stroke implicitly");
                    StrokeBuilder::start(to, style)
                });
                if exceeds_threshold(builder.cursor(), to, size, threshold) {
                    builder.quad_to(to);
                }
            }
            StrokePhase::Up => {
                let builder = self.current.take().unwrap_or_else(|| {
                    trace!("UP without DOWN, starting stroke implicitly");
                    StrokeBuilder::start(to, style)
                });
                self.log.push(builder.finish());
                self.local_stroke = false;
            }
        }
    }

    /// Applies a canvas-wide action. Returns `true` if the canvas changed.
    ///
    /// UNDO removes the newest committed stroke (no-op on an empty log).
    /// DRAW and ERASE are reserved and change nothing.
    pub fn apply_draw_action(&mut self, action: DrawActionKind) -> bool {
        match action {
            DrawActionKind::Undo => self.log.undo().is_some(),
            DrawActionKind::Draw | DrawActionKind::Erase => {
                trace!(?action, "reserved draw action ignored");
                false
            }
        }
    }

    /// Rebuilds the canvas from scratch out of `entries`.
    ///
    /// Clears everything, then feeds each draw point and draw action
    /// through the live code path, in order. Other message kinds are
    /// skipped. Replaying the same entries twice yields the same canvas.
    pub fn replay<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = Message>,
    {
        self.clear();
        let mut applied = 0usize;
        for entry in entries {
            match entry {
                Message::DrawPoint(point) => self.apply_draw_point(&point),
                Message::DrawAction(DrawAction { action }) => {
                    self.apply_draw_action(action);
                }
                other => {
                    debug!(type_name = other.type_name(), "skipping non-draw history entry");
                    continue;
                }
            }
            applied += 1;
        }
        debug!(applied, strokes = self.log.len(), "canvas replayed");
    }

    /// Decodes a [`RoundHistory`] and replays it. Entries that fail to
    /// decode are logged and skipped. Returns how many were skipped.
    pub fn replay_history<C: Codec>(
        &mut self,
        history: &RoundHistory,
        codec: &C,
    ) -> usize {
        let mut failed = 0usize;
        let entries = history
            .decode_entries(codec)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(message) => Some(message),
                Err(e) => {
                    warn!(error = %e, "dropping undecodable history entry");
                    failed += 1;
                    None
                }
            })
            .collect::<Vec<_>>();
        self.replay(entries);
        failed
    }

    /// Drops every stroke, committed or in progress.
    pub fn clear(&mut self) {
        self.log.clear();
        self.current = None;
        self.local_stroke = false;
    }

    // -- Local input ----------------------------------------------------

    /// Turns pointer input into a draw message.
    ///
    /// The point is normalized against the current canvas size, mirrored
    /// onto the local canvas through [`Self::apply_draw_point`], and
    /// returned for sending.
    ///
    /// # Errors
    /// [`CanvasError::EmptyCanvas`] before the first [`Self::resize`].
    pub fn local_pointer_event(
        &mut self,
        point: DevicePoint,
        phase: StrokePhase,
    ) -> Result<DrawPoint, CanvasError> {
        let size = self.size.ok_or(CanvasError::EmptyCanvas)?;
        let to = NormalizedPoint::from_device(point, size);
        let from = match phase {
            StrokePhase::Down => to,
            StrokePhase::Move | StrokePhase::Up => self
                .current
                .as_ref()
                .map_or(to, StrokeBuilder::cursor),
        };

        let draw = self.draw_point(from, to, phase);
        self.apply_draw_point(&draw);
        self.local_stroke = phase != StrokePhase::Up;
        Ok(draw)
    }

    /// Undoes the newest stroke locally and returns the message to send.
    pub fn local_undo(&mut self) -> DrawAction {
        self.apply_draw_action(DrawActionKind::Undo);
        DrawAction {
            action: DrawActionKind::Undo,
        }
    }

    /// Commits a local stroke that is still in progress, as if the pen was
    /// lifted at the last accepted point. Returns the UP to send, or `None`
    /// if no local stroke was in progress.
    pub fn finish_local_stroke(&mut self) -> Option<DrawPoint> {
        if !self.local_stroke {
            return None;
        }
        let cursor = self.current.as_ref()?.cursor();
        let up = self.draw_point(cursor, cursor, StrokePhase::Up);
        self.apply_draw_point(&up);
        debug!("local stroke finished at round end");
        Some(up)
    }

    fn draw_point(
        &self,
        from: NormalizedPoint,
        to: NormalizedPoint,
        phase: StrokePhase,
    ) -> DrawPoint {
        DrawPoint {
            room_name: self.room_name.clone(),
            color: self.style.color,
            stroke_width: self.style.stroke_width,
            from_x: from.x(),
            from_y: from.y(),
            to_x: to.x(),
            to_y: to.y(),
            phase,
        }
    }

    // -- Settings & queries ---------------------------------------------

    /// Updates the canvas size used for normalization and smoothing.
    ///
    /// # Errors
    /// [`CanvasError::InvalidSize`]; the previous size is kept.
    pub fn resize(&mut self, width: f32, height: f32) -> Result<(), CanvasError> {
        let size = CanvasSize::new(width, height)?;
        debug!(width, height, "canvas resized");
        self.size = Some(size);
        Ok(())
    }

    pub fn size(&self) -> Option<CanvasSize> {
        self.size
    }

    /// Sets the pen used for local strokes started from now on.
    pub fn set_style(&mut self, style: StrokeStyle) {
        self.style = style;
    }

    pub fn style(&self) -> StrokeStyle {
        self.style
    }

    pub fn room_name(&self) -> &str {
        &self.room_name
    }

    /// Committed strokes, oldest first.
    pub fn strokes(&self) -> &[Stroke] {
        self.log.as_slice()
    }

    /// The stroke being drawn right now, if any.
    pub fn current_stroke(&self) -> Option<&Stroke> {
        self.current.as_ref().map(StrokeBuilder::stroke)
    }

    /// Whether a locally started stroke is waiting for its UP.
    pub fn is_local_stroke_active(&self) -> bool {
        self.local_stroke
    }
}

/// Whether moving from `from` to `to` travels further than `threshold`
/// device pixels. Without a known canvas size any movement counts.
fn exceeds_threshold(
    from: NormalizedPoint,
    to: NormalizedPoint,
    size: Option<CanvasSize>,
    threshold: f32,
) -> bool {
    match size {
        Some(size) => from.to_device(size).distance(to.to_device(size)) > threshold,
        None => from != to,
    }
}
