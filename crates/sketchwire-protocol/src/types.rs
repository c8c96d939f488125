//! Wire types for Sketchwire's message stream.
//!
//! Every struct in this module is the payload of one message `type`. The
//! payloads are plain serde structs; the `type` discriminator itself is
//! added and stripped by the codec (see [`crate::MessageType`]), so none of
//! these types carry it as a field.
//!
//! Field names follow the deployed game server (`playerName`,
//! `motionEvent`, `countdownTimerMillis`, ...). Rust-side names describe
//! what the field means to the client; `#[serde(rename)]` bridges the two.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// The stable per-installation identifier of a participant.
///
/// Two participants may share a display name, so anything that needs to
/// know "is this me?" compares `ClientId`s, never names.
///
/// `#[serde(transparent)]` keeps it a plain JSON string on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub String);

impl ClientId {
    /// Wraps any string-like value as a `ClientId`.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrows the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// The server-authoritative stage of the game.
///
/// The client never moves between phases on its own. The one exception is
/// the fall back to [`Phase::Initial`] when the connection is lost.
///
/// Each variant is renamed to the server's constant; the `alias` lets us
/// also accept the descriptive spelling.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default,
)]
pub enum Phase {
    /// Not connected, or connected but no phase received yet.
    #[default]
    #[serde(rename = "INITIAL_STATE", alias = "INITIAL")]
    Initial,

    /// Fewer participants than the room needs to start.
    #[serde(rename = "WAITING_FOR_PLAYERS", alias = "WAITING_FOR_PARTICIPANTS")]
    WaitingForParticipants,

    /// Enough participants; the start countdown is running.
    #[serde(rename = "WAITING_FOR_START", alias = "WAITING_TO_START")]
    WaitingToStart,

    /// A drawing participant was chosen and is picking a word.
    #[serde(rename = "NEW_ROUND", alias = "ROUND_STARTING")]
    RoundStarting,

    /// The drawing participant draws, everyone else guesses.
    #[serde(rename = "ROUND_IN_PROGRESS", alias = "ROUND_ACTIVE")]
    RoundActive,

    /// The word is revealed; nobody may draw.
    #[serde(rename = "ROUND_ENDED")]
    RoundEnded,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Initial => "Initial",
            Self::WaitingForParticipants => "WaitingForParticipants",
            Self::WaitingToStart => "WaitingToStart",
            Self::RoundStarting => "RoundStarting",
            Self::RoundActive => "RoundActive",
            Self::RoundEnded => "RoundEnded",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Drawing
// ---------------------------------------------------------------------------

/// A 32-bit ARGB color, serialized as the signed integer the server uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(pub i32);

impl Color {
    /// Opaque black, the default pen color.
    pub const BLACK: Color = Color::from_argb(0xFF00_0000);

    /// Opaque white.
    pub const WHITE: Color = Color::from_argb(0xFFFF_FFFF);

    /// Builds a color from its unsigned `0xAARRGGBB` form.
    pub const fn from_argb(argb: u32) -> Self {
        Self(argb as i32)
    }

    /// Returns the unsigned `0xAARRGGBB` form.
    pub const fn argb(self) -> u32 {
        self.0 as u32
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

/// Where in a pen gesture a [`DrawPoint`] sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrokePhase {
    /// Pen touched the canvas: starts a new stroke.
    #[serde(rename = "ACTION_DOWN", alias = "DOWN")]
    Down,
    /// Pen moved while touching.
    #[serde(rename = "ACTION_MOVE", alias = "MOVE")]
    Move,
    /// Pen lifted: commits the stroke.
    #[serde(rename = "ACTION_UP", alias = "UP")]
    Up,
}

/// One incremental drawing event.
///
/// All four coordinates are fractions of the canvas extent in `[0, 1]`,
/// so a stroke drawn on a phone replays correctly on a tablet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawPoint {
    pub room_name: String,
    pub color: Color,
    /// Pen width in device pixels of the sender.
    #[serde(alias = "thickness")]
    pub stroke_width: f32,
    pub from_x: f32,
    pub from_y: f32,
    pub to_x: f32,
    pub to_y: f32,
    #[serde(rename = "motionEvent")]
    pub phase: StrokePhase,
}

/// A canvas-wide drawing command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DrawActionKind {
    /// Remove the most recently committed stroke.
    #[serde(rename = "ACTION_UNDO", alias = "DRAW_ACTION_UNDO", alias = "UNDO")]
    Undo,
    /// Reserved. Carries no canvas mutation.
    #[serde(rename = "ACTION_DRAW", alias = "DRAW_ACTION_DRAW", alias = "DRAW")]
    Draw,
    /// Reserved. Carries no canvas mutation.
    #[serde(rename = "ACTION_ERASE", alias = "DRAW_ACTION_ERASE", alias = "ERASE")]
    Erase,
}

/// Payload of `TYPE_DRAW_ACTION`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawAction {
    pub action: DrawActionKind,
}

/// Replay log for clients that join (or resync) mid-round.
///
/// Each entry is a complete encoded message, usually a draw point or a
/// draw action, in the order the server observed them. Decode them with
/// [`RoundHistory::decode_entries`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundHistory {
    #[serde(rename = "data", default)]
    pub entries: Vec<String>,
}

// ---------------------------------------------------------------------------
// Phase updates
// ---------------------------------------------------------------------------

/// What a [`PhaseUpdate`] asks the client to do.
///
/// On the wire a missing `gamePhase` means "timer tick, stay in the current
/// phase". Making the two cases separate variants means nobody has to
/// remember what `None` stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseChange {
    /// Countdown sync only.
    Tick { countdown_millis: u64 },
    /// Enter `phase` (if not already there) with a fresh countdown.
    Transition { phase: Phase, countdown_millis: u64 },
}

impl PhaseChange {
    /// The server's countdown value carried by either variant.
    pub fn countdown_millis(&self) -> u64 {
        match self {
            Self::Tick { countdown_millis }
            | Self::Transition {
                countdown_millis, ..
            } => *countdown_millis,
        }
    }

    /// The target phase, if this is a transition.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Self::Tick { .. } => None,
            Self::Transition { phase, .. } => Some(*phase),
        }
    }
}

/// Payload of `TYPE_GAME_PHASE_UPDATE`.
///
/// Serde goes through [`RawPhaseUpdate`] (`from`/`into`) so the Rust type
/// can use [`PhaseChange`] while the wire keeps its nullable field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawPhaseUpdate", into = "RawPhaseUpdate")]
pub struct PhaseUpdate {
    pub change: PhaseChange,
    /// Name of the participant drawing this round, when the server says.
    pub drawing_participant_name: Option<String>,
}

impl PhaseUpdate {
    /// A countdown-only update.
    pub fn tick(countdown_millis: u64) -> Self {
        Self {
            change: PhaseChange::Tick { countdown_millis },
            drawing_participant_name: None,
        }
    }

    /// A phase transition.
    pub fn transition(phase: Phase, countdown_millis: u64) -> Self {
        Self {
            change: PhaseChange::Transition {
                phase,
                countdown_millis,
            },
            drawing_participant_name: None,
        }
    }

    /// Attaches the drawing participant's display name.
    pub fn with_drawing_participant(mut self, name: impl Into<String>) -> Self {
        self.drawing_participant_name = Some(name.into());
        self
    }
}

/// The literal wire shape of a phase update.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPhaseUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    game_phase: Option<Phase>,
    #[serde(default)]
    countdown_timer_millis: u64,
    #[serde(
        rename = "drawingPlayerName",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    drawing_participant_name: Option<String>,
}

impl From<RawPhaseUpdate> for PhaseUpdate {
    fn from(raw: RawPhaseUpdate) -> Self {
        let countdown_millis = raw.countdown_timer_millis;
        let change = match raw.game_phase {
            Some(phase) => PhaseChange::Transition {
                phase,
                countdown_millis,
            },
            None => PhaseChange::Tick { countdown_millis },
        };
        Self {
            change,
            drawing_participant_name: raw.drawing_participant_name,
        }
    }
}

impl From<PhaseUpdate> for RawPhaseUpdate {
    fn from(update: PhaseUpdate) -> Self {
        Self {
            game_phase: update.change.phase(),
            countdown_timer_millis: update.change.countdown_millis(),
            drawing_participant_name: update.drawing_participant_name,
        }
    }
}

// ---------------------------------------------------------------------------
// Participants
// ---------------------------------------------------------------------------

/// Payload of `TYPE_GAME_STATE`: who draws, and the word.
///
/// The drawing participant receives the real word; everyone else receives
/// it masked.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantState {
    #[serde(rename = "drawingPlayerName", default)]
    pub drawing_participant_name: Option<String>,
    #[serde(rename = "drawingPlayerClientId", default)]
    pub drawing_participant_id: Option<ClientId>,
    #[serde(default)]
    pub word_to_guess: Option<String>,
}

/// One roster row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantInfo {
    #[serde(rename = "playerName")]
    pub name: String,
    #[serde(rename = "isDrawingPlayer", alias = "isDrawing", default)]
    pub is_drawing: bool,
    #[serde(default)]
    pub score: i32,
    #[serde(default)]
    pub rank: i32,
}

/// Payload of `TYPE_PLAYERS_LIST`: the full roster, already ranked.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RosterUpdate {
    #[serde(rename = "players", default)]
    pub participants: Vec<ParticipantInfo>,
}

// ---------------------------------------------------------------------------
// Chat & announcements
// ---------------------------------------------------------------------------

/// Payload of `TYPE_CHAT_MESSAGE`. Guesses travel as chat messages too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatEvent {
    pub from_client_id: ClientId,
    #[serde(rename = "fromPlayerName")]
    pub from_participant_name: String,
    pub room_name: String,
    pub message: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

/// Kinds of server announcement.
///
/// Encoded as small integers. Unknown codes decode as
/// [`AnnouncementKind::General`] so a new server-side kind still shows up
/// in the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum AnnouncementKind {
    GuessedCorrectly,
    Joined,
    Exited,
    EveryoneGuessed,
    NobodyGuessed,
    General,
}

impl From<i64> for AnnouncementKind {
    fn from(code: i64) -> Self {
        match code {
            0 => Self::GuessedCorrectly,
            1 => Self::Joined,
            2 => Self::Exited,
            3 => Self::EveryoneGuessed,
            4 => Self::NobodyGuessed,
            _ => Self::General,
        }
    }
}

impl From<AnnouncementKind> for i64 {
    fn from(kind: AnnouncementKind) -> Self {
        match kind {
            AnnouncementKind::GuessedCorrectly => 0,
            AnnouncementKind::Joined => 1,
            AnnouncementKind::Exited => 2,
            AnnouncementKind::EveryoneGuessed => 3,
            AnnouncementKind::NobodyGuessed => 4,
            AnnouncementKind::General => 5,
        }
    }
}

/// Payload of `TYPE_ANNOUNCEMENT`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnouncementEvent {
    pub message: String,
    pub timestamp: i64,
    #[serde(rename = "announcementType")]
    pub kind: AnnouncementKind,
}

// ---------------------------------------------------------------------------
// Session plumbing
// ---------------------------------------------------------------------------

/// Payload of `TYPE_JOIN_ROOM_HANDSHAKE`, the first message a client sends
/// on every (re)connect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinHandshake {
    #[serde(rename = "playerName")]
    pub participant_name: String,
    pub room_name: String,
    pub client_id: ClientId,
}

/// Payload of `TYPE_PING`. The server pings without a name; the client
/// answers with its own.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KeepAlive {
    #[serde(
        rename = "playerName",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub participant_name: Option<String>,
}

/// Server-side error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum ErrorKind {
    /// The room named in the handshake does not exist (any more).
    RoomNotFound,
    /// A code this client does not know.
    Other(i32),
}

impl From<i32> for ErrorKind {
    fn from(code: i32) -> Self {
        match code {
            1 => Self::RoomNotFound,
            other => Self::Other(other),
        }
    }
}

impl From<ErrorKind> for i32 {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::RoomNotFound => 1,
            ErrorKind::Other(code) => code,
        }
    }
}

/// Payload of `TYPE_GAME_ERROR`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEvent {
    #[serde(rename = "errorType")]
    pub kind: ErrorKind,
    #[serde(rename = "errorMessage", default)]
    pub detail: Option<String>,
}

// ---------------------------------------------------------------------------
// Word selection
// ---------------------------------------------------------------------------

/// Payload of `TYPE_WORDS_TO_PICK_HOLDER`: the candidate words offered to
/// the drawing participant at the start of a round.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WordsToPick {
    #[serde(default)]
    pub words: Vec<String>,
}

/// Payload of `TYPE_SET_WORD_TO_GUESS`: the drawing participant's choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetWordToGuess {
    pub word_to_guess: String,
    pub room_name: String,
}

/// Payload of `TYPE_DISCONNECT_REQUEST`.
///
/// A permanent request leaves the room for good. A temporary one tells
/// the server the participant is stepping away (app in the background)
/// and will rejoin with the same client id, so it keeps their seat.
/// A payload without the flag is permanent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisconnectRequest {
    #[serde(rename = "isPermanentDisconnect", default = "permanent_by_default")]
    pub permanent: bool,
}

impl DisconnectRequest {
    pub fn permanent() -> Self {
        Self { permanent: true }
    }

    pub fn temporary() -> Self {
        Self { permanent: false }
    }
}

impl Default for DisconnectRequest {
    fn default() -> Self {
        Self::permanent()
    }
}

fn permanent_by_default() -> bool {
    true
}

// =========================================================================
// Tests
// =========================================================================
