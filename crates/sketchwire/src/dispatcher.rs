//! The synchronous heart of the client: message dispatch and local input.
//!
//! [`GameCore`] owns one set of state components for a game session:
//!
//! - a [`PathSynchronizer`] (the canvas)
//! - a [`PhaseMachine`] (phase, countdown, UI flags)
//! - a [`SessionAggregator`] (feed, roster, participant state, words)
//!
//! Every inbound message goes through [`GameCore::dispatch`], which visits
//! the components in a fixed order (synchronizer, then phase machine, then
//! aggregator) and collects what the caller must do next into a
//! [`Dispatch`]: messages to send, events to publish, and what the
//! countdown ticker should do.
//!
//! `GameCore` does no I/O. The [`GameClient`](crate::GameClient) actor
//! drives it; tests drive it directly.

use sketchwire_canvas::{
    CanvasConfig, CanvasError, DevicePoint, PathSynchronizer, Stroke,
    StrokeStyle,
};
use sketchwire_game::{
    CountdownCommand, FeedItem, LocalParticipant, PhaseFlags, PhaseMachine,
    PhaseOutcome, PhaseTransition, SessionAggregator,
};
use sketchwire_protocol::{
    ChatEvent, Codec, DrawAction, DrawPoint, ErrorEvent, JoinHandshake,
    Message, ParticipantInfo, ParticipantState, Phase, SetWordToGuess,
    StrokePhase,
};
use tracing::{debug, info, trace, warn};

use crate::ClientError;

// ---------------------------------------------------------------------------
// Events & dispatch results
// ---------------------------------------------------------------------------

/// Notifications for the UI layer, published by the client actor.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// A connection to the server is open and the join handshake was sent.
    Connected,
    /// The connection dropped or a dial failed. The client keeps retrying.
    ConnectionLost { reason: Option<String> },
    /// The server moved the game to another phase.
    PhaseChanged {
        transition: PhaseTransition,
        flags: PhaseFlags,
    },
    /// The countdown shown to the user changed.
    CountdownUpdated { remaining_millis: u64 },
    /// Strokes were added, removed, or replaced.
    CanvasChanged,
    RosterUpdated(Vec<ParticipantInfo>),
    ParticipantStateUpdated {
        state: ParticipantState,
        local_participant_drawing: bool,
    },
    /// A chat message or announcement was appended to the feed.
    FeedAppended(FeedItem),
    /// The server offered words to the local participant.
    WordsOffered(Vec<String>),
    /// The server reported an error. The client stops after this.
    ApplicationError(ErrorEvent),
    /// The client actor has stopped. Always the last event.
    Stopped,
}

/// What the caller must do after feeding the core a message or a
/// connection change.
#[derive(Debug, Default)]
pub struct Dispatch {
    /// Messages to send to the server, in order.
    pub outbound: Vec<Message>,
    /// Events to publish, in order.
    pub events: Vec<ClientEvent>,
    pub countdown: Option<CountdownCommand>,
    /// The session must end: no more messages are processed.
    pub terminal: bool,
}

impl Dispatch {
    fn event(&mut self, event: ClientEvent) {
        self.events.push(event);
    }
}

/// A point-in-time copy of everything the UI renders.
#[derive(Debug, Clone, PartialEq)]
pub struct GameSnapshot {
    pub local: LocalParticipant,
    pub phase: Phase,
    pub flags: PhaseFlags,
    pub countdown_millis: Option<u64>,
    /// Whether local pointer input is accepted right now.
    pub can_draw: bool,
    pub strokes: Vec<Stroke>,
    pub current_stroke: Option<Stroke>,
    pub style: StrokeStyle,
    pub roster: Vec<ParticipantInfo>,
    pub feed: Vec<FeedItem>,
    pub participant_state: Option<ParticipantState>,
    pub words_to_pick: Vec<String>,
    pub last_error: Option<ErrorEvent>,
}

// ---------------------------------------------------------------------------
// GameCore
// ---------------------------------------------------------------------------

/// State components for one game session plus the rules for routing
/// messages between them.
#[derive(Debug)]
pub struct GameCore<C: Codec> {
    codec: C,
    canvas: PathSynchronizer,
    phase: PhaseMachine,
    session: SessionAggregator,
}

impl<C: Codec> GameCore<C> {
    pub fn new(local: LocalParticipant, canvas: CanvasConfig, codec: C) -> Self {
        Self {
            codec,
            canvas: PathSynchronizer::new(local.room_name.clone(), canvas),
            phase: PhaseMachine::new(),
            session: SessionAggregator::new(local),
        }
    }

    // -- Inbound ----------------------------------------------------------

    /// Routes one server message through the state components.
    pub fn dispatch(&mut self, message: Message) -> Dispatch {
        let mut out = Dispatch::default();
        trace!(type_name = message.type_name(), "dispatching");

        match message {
            // Synchronizer
            Message::DrawPoint(point) => {
                self.canvas.apply_draw_point(&point);
                out.event(ClientEvent::CanvasChanged);
            }
            Message::DrawAction(DrawAction { action }) => {
                if self.canvas.apply_draw_action(action) {
                    out.event(ClientEvent::CanvasChanged);
                }
            }
            Message::RoundHistory(history) => {
                let skipped = self.canvas.replay_history(&history, &self.codec);
                if skipped > 0 {
                    warn!(skipped, "round history had undecodable entries");
                }
                out.event(ClientEvent::CanvasChanged);
            }

            // Phase machine
            Message::PhaseUpdate(update) => {
                let outcome = self.phase.apply(&update);
                self.apply_phase_outcome(outcome, &mut out);
            }

            // Aggregator
            Message::ParticipantState(state) => {
                self.session.set_participant_state(state.clone());
                out.event(ClientEvent::ParticipantStateUpdated {
                    state,
                    local_participant_drawing: self
                        .session
                        .is_local_participant_drawing(),
                });
            }
            Message::RosterUpdate(roster) => {
                self.session.set_roster(roster);
                out.event(ClientEvent::RosterUpdated(
                    self.session.current_roster().to_vec(),
                ));
            }
            Message::Chat(chat) => self.append(FeedItem::Chat(chat), &mut out),
            Message::Announcement(announcement) => {
                self.append(FeedItem::Announcement(announcement), &mut out);
            }
            Message::KeepAlive(_) => {
                out.outbound
                    .push(Message::KeepAlive(self.session.keep_alive_reply()));
            }
            Message::WordsToPick(offer) => {
                let words = offer.words.clone();
                self.phase.set_words_offered(!words.is_empty());
                self.session.offer_words(offer);
                out.event(ClientEvent::WordsOffered(words));
            }
            Message::Error(error) => {
                warn!(kind = ?error.kind, detail = ?error.detail, "server reported an error");
                self.session.record_error(error.clone());
                out.event(ClientEvent::ApplicationError(error));
                out.terminal = true;
            }

            // Client-to-server kinds have no meaning inbound.
            Message::JoinHandshake(_)
            | Message::SetWordToGuess(_)
            | Message::Disconnect(_) => {
                debug!(
                    type_name = message.type_name(),
                    "ignoring client-bound copy of an outbound message"
                );
            }
            Message::Unrecognized { .. } => {}
        }

        out
    }

    /// A connection opened: introduce ourselves.
    pub fn connection_opened(&mut self) -> Dispatch {
        let mut out = Dispatch::default();
        out.outbound
            .push(Message::JoinHandshake(self.session.join_handshake()));
        out.event(ClientEvent::Connected);
        out
    }

    /// The connection dropped (or a dial failed).
    pub fn connection_lost(&mut self, reason: Option<String>) -> Dispatch {
        let mut out = Dispatch::default();
        let outcome = self.phase.connection_lost();
        self.session.connection_lost();
        out.event(ClientEvent::ConnectionLost { reason });
        if let Some(transition) = outcome.transition {
            out.event(ClientEvent::PhaseChanged {
                transition,
                flags: self.phase.flags(),
            });
        }
        out.countdown = Some(outcome.countdown);
        out
    }

    /// Records a value from the local countdown ticker.
    pub fn countdown_tick(&mut self, remaining_millis: u64) -> ClientEvent {
        ClientEvent::CountdownUpdated {
            remaining_millis: self.phase.apply_countdown_tick(remaining_millis),
        }
    }

    fn apply_phase_outcome(&mut self, outcome: PhaseOutcome, out: &mut Dispatch) {
        if outcome.clear_strokes {
            self.canvas.clear();
            out.event(ClientEvent::CanvasChanged);
        }
        if outcome.finish_stroke {
            if let Some(up) = self.canvas.finish_local_stroke() {
                out.outbound.push(Message::DrawPoint(up));
                out.event(ClientEvent::CanvasChanged);
            }
        }
        if let Some(transition) = outcome.transition {
            if transition.from == Phase::RoundStarting {
                self.session.withdraw_words();
            }
            out.event(ClientEvent::PhaseChanged {
                transition,
                flags: self.phase.flags(),
            });
        }
        out.countdown = Some(outcome.countdown);
    }

    fn append(&mut self, item: FeedItem, out: &mut Dispatch) {
        self.session.append(item.clone());
        out.event(ClientEvent::FeedAppended(item));
    }

    // -- Local input ------------------------------------------------------

    /// Whether local pointer input is accepted: the phase allows drawing
    /// and the local participant holds drawing rights.
    pub fn can_draw(&self) -> bool {
        self.phase.flags().drawing_permitted
            && self.session.is_local_participant_drawing()
    }

    /// Turns pointer input into a draw message to send.
    ///
    /// # Errors
    /// - [`GameError::NotDrawingParticipant`](sketchwire_game::GameError)
    ///   when the local participant may not draw right now.
    /// - [`CanvasError::EmptyCanvas`] before the first [`Self::resize`].
    pub fn pointer(
        &mut self,
        point: DevicePoint,
        phase: StrokePhase,
    ) -> Result<DrawPoint, ClientError> {
        self.ensure_can_draw()?;
        Ok(self.canvas.local_pointer_event(point, phase)?)
    }

    /// Undoes the newest stroke and returns the message to send.
    ///
    /// # Errors
    /// [`GameError::NotDrawingParticipant`](sketchwire_game::GameError)
    /// when the local participant may not draw right now.
    pub fn undo(&mut self) -> Result<DrawAction, ClientError> {
        self.ensure_can_draw()?;
        Ok(self.canvas.local_undo())
    }

    fn ensure_can_draw(&self) -> Result<(), ClientError> {
        if self.can_draw() {
            Ok(())
        } else {
            debug!(phase = %self.phase.phase(), "local drawing rejected");
            Err(sketchwire_game::GameError::NotDrawingParticipant.into())
        }
    }

    /// Builds a chat message.
    ///
    /// # Errors
    /// [`GameError::EmptyChatMessage`](sketchwire_game::GameError) for
    /// blank text.
    pub fn chat(&self, text: &str, timestamp: i64) -> Result<ChatEvent, ClientError> {
        Ok(self.session.chat(text, timestamp)?)
    }

    /// Picks one of the offered words and hides the word overlay.
    ///
    /// # Errors
    /// See [`SessionAggregator::pick_word`].
    pub fn pick_word(&mut self, word: &str) -> Result<SetWordToGuess, ClientError> {
        let pick = self.session.pick_word(word)?;
        self.phase.set_words_offered(false);
        info!(word, "word chosen");
        Ok(pick)
    }

    pub fn join_handshake(&self) -> JoinHandshake {
        self.session.join_handshake()
    }

    /// # Errors
    /// [`CanvasError::InvalidSize`]; the previous size is kept.
    pub fn resize(&mut self, width: f32, height: f32) -> Result<(), CanvasError> {
        self.canvas.resize(width, height)
    }

    pub fn set_style(&mut self, style: StrokeStyle) {
        self.canvas.set_style(style);
    }

    // -- Queries ----------------------------------------------------------

    pub fn canvas(&self) -> &PathSynchronizer {
        &self.canvas
    }

    pub fn phase(&self) -> &PhaseMachine {
        &self.phase
    }

    pub fn session(&self) -> &SessionAggregator {
        &self.session
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            local: self.session.local().clone(),
            phase: self.phase.phase(),
            flags: self.phase.flags(),
            countdown_millis: self.phase.displayed_countdown_millis(),
            can_draw: self.can_draw(),
            strokes: self.canvas.strokes().to_vec(),
            current_stroke: self.canvas.current_stroke().cloned(),
            style: self.canvas.style(),
            roster: self.session.current_roster().to_vec(),
            feed: self.session.feed().to_vec(),
            participant_state: self.session.participant_state().cloned(),
            words_to_pick: self.session.words_to_pick().to_vec(),
            last_error: self.session.last_error().cloned(),
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
