//! Game phase state machine.
//!
//! The server owns the game lifecycle. The client's machine only follows
//! it, and derives what the UI may offer in each phase:
//!
//! ```text
//!              ┌──────────────────── (server-driven, any order) ───────────────────┐
//!   Initial ──►│ WaitingForParticipants ⇄ WaitingToStart → RoundStarting →         │
//!              │   RoundActive → RoundEnded → RoundStarting → ...                   │
//!              └───────────────────────────────────────────────────────────────────┘
//!   any ──(connection lost)──► Initial
//! ```
//!
//! The client never moves on its own, except back to [`Phase::Initial`]
//! when the connection drops. The server is trusted to send sensible
//! transitions, so the machine accepts any target phase.
//!
//! # Countdown
//!
//! Every update carries the server's countdown, which always replaces the
//! stored value and reseeds the local ticker. The ticker only interpolates
//! between server updates. What the user sees is kept separately: within
//! one phase the displayed countdown never goes up, so a server correction
//! upward holds the display until the reseeded ticker catches up with it.
//! A transition resets the display.

use sketchwire_protocol::{Phase, PhaseUpdate};
use tracing::{debug, info};

// ---------------------------------------------------------------------------
// Outcome types
// ---------------------------------------------------------------------------

/// What the local countdown ticker should do after an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownCommand {
    /// (Re)start the ticker at this many milliseconds.
    Restart(u64),
    /// Stop the ticker.
    Cancel,
    /// Leave the ticker alone.
    Keep,
}

/// A phase change that actually happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTransition {
    pub from: Phase,
    pub to: Phase,
}

/// Everything the caller has to act on after [`PhaseMachine::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseOutcome {
    /// Set when the phase changed.
    pub transition: Option<PhaseTransition>,
    pub countdown: CountdownCommand,
    /// A new round is starting: wipe the canvas.
    pub clear_strokes: bool,
    /// The round ended: a local stroke still in progress must be finished.
    pub finish_stroke: bool,
}

impl PhaseOutcome {
    fn keep() -> Self {
        Self {
            transition: None,
            countdown: CountdownCommand::Keep,
            clear_strokes: false,
            finish_stroke: false,
        }
    }
}

/// UI affordances that depend only on the phase (and, for the overlay,
/// on whether words were offered).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PhaseFlags {
    /// Show the "pick a word" overlay to the drawing participant.
    pub pick_word_overlay_visible: bool,
    /// The phase allows drawing at all. Whether *this* participant may
    /// draw also depends on drawing rights.
    pub drawing_permitted: bool,
    pub chat_enabled: bool,
}

// ---------------------------------------------------------------------------
// Machine
// ---------------------------------------------------------------------------

/// Tracks the current phase, its countdown, and its flags.
#[derive(Debug, Default)]
pub struct PhaseMachine {
    phase: Phase,
    countdown_millis: Option<u64>,
    displayed_millis: Option<u64>,
    drawing_participant_name: Option<String>,
    words_offered: bool,
    flags: PhaseFlags,
}

impl PhaseMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a server phase update.
    ///
    /// 1. A transition to a phase other than the current one switches phase
    ///    and recomputes the flags. A "transition" to the current phase is
    ///    treated as a plain countdown sync.
    /// 2. The countdown is always replaced by the server's value.
    /// 3. The ticker is restarted with the new countdown, except while
    ///    waiting for participants, where it is cancelled.
    pub fn apply(&mut self, update: &PhaseUpdate) -> PhaseOutcome {
        let mut outcome = PhaseOutcome::keep();
        let incoming = update.change.countdown_millis();

        if let Some(name) = &update.drawing_participant_name {
            self.drawing_participant_name = Some(name.clone());
        }

        let entered = match update.change.phase() {
            Some(target) if target != self.phase => {
                let transition = self.enter(target);
                outcome.transition = Some(transition);
                outcome.clear_strokes = target == Phase::RoundStarting;
                outcome.finish_stroke = target == Phase::RoundEnded;
                true
            }
            _ => false,
        };

        if self.phase == Phase::WaitingForParticipants {
            self.countdown_millis = None;
            self.displayed_millis = None;
            outcome.countdown = CountdownCommand::Cancel;
            return outcome;
        }

        if entered {
            self.displayed_millis = None;
        } else if let Some(shown) = self.displayed_millis {
            if incoming > shown {
                debug!(shown, incoming, "server raised the countdown within phase");
            }
            self.displayed_millis = Some(shown.min(incoming));
        }
        self.countdown_millis = Some(incoming);
        outcome.countdown = CountdownCommand::Restart(incoming);
        outcome
    }

    /// Records a value emitted by the local ticker and returns the value to
    /// display, which never rises within a phase.
    pub fn apply_countdown_tick(&mut self, remaining_millis: u64) -> u64 {
        let shown = self
            .displayed_millis
            .map_or(remaining_millis, |shown| shown.min(remaining_millis));
        self.displayed_millis = Some(shown);
        shown
    }

    /// The connection dropped: back to [`Phase::Initial`], timer stopped.
    pub fn connection_lost(&mut self) -> PhaseOutcome {
        let mut outcome = PhaseOutcome::keep();
        if self.phase != Phase::Initial {
            outcome.transition = Some(self.enter(Phase::Initial));
        }
        self.countdown_millis = None;
        self.displayed_millis = None;
        self.drawing_participant_name = None;
        outcome.countdown = CountdownCommand::Cancel;
        outcome
    }

    /// Words were offered to (`true`) or picked by (`false`) the local
    /// participant. Only affects the overlay while a round is starting.
    pub fn set_words_offered(&mut self, offered: bool) {
        self.words_offered = offered;
        self.flags.pick_word_overlay_visible =
            offered && self.phase == Phase::RoundStarting;
    }

    fn enter(&mut self, target: Phase) -> PhaseTransition {
        let from = self.phase;
        self.phase = target;
        if target != Phase::RoundStarting {
            self.words_offered = false;
        }
        self.flags = flags_for(target, self.words_offered);
        info!(%from, to = %target, "phase transition");
        PhaseTransition { from, to: target }
    }

    // -- Queries --------------------------------------------------------

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The server's latest countdown, or `None` when no timer runs.
    pub fn countdown_millis(&self) -> Option<u64> {
        self.countdown_millis
    }

    /// The countdown as last shown to the user: the newest local tick,
    /// never above an earlier one in the same phase.
    pub fn displayed_countdown_millis(&self) -> Option<u64> {
        self.displayed_millis.or(self.countdown_millis)
    }

    pub fn drawing_participant_name(&self) -> Option<&str> {
        self.drawing_participant_name.as_deref()
    }

    pub fn flags(&self) -> PhaseFlags {
        self.flags
    }
}

fn flags_for(phase: Phase, words_offered: bool) -> PhaseFlags {
    match phase {
        Phase::Initial => PhaseFlags::default(),
        Phase::WaitingForParticipants | Phase::WaitingToStart | Phase::RoundEnded => {
            PhaseFlags {
                chat_enabled: true,
                ..PhaseFlags::default()
            }
        }
        Phase::RoundStarting => PhaseFlags {
            pick_word_overlay_visible: words_offered,
            drawing_permitted: false,
            chat_enabled: true,
        },
        Phase::RoundActive => PhaseFlags {
            pick_word_overlay_visible: false,
            drawing_permitted: true,
            chat_enabled: true,
        },
    }
}

// =========================================================================
// Tests
// =========================================================================
