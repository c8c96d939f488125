//! The session aggregator: everything about "who is here and what was
//! said" for one game session.
//!
//! It keeps:
//! - the chat/announcement feed, in server order, append-only
//! - the latest roster snapshot
//! - the latest participant state (who draws, the word)
//! - the words currently offered to the local participant
//! - the last application error the server reported
//!
//! and builds the outbound messages that speak for the local participant
//! (handshake, keep-alive replies, chat, word pick).
//!
//! # Concurrency note
//!
//! Like the rest of the game state it is a plain struct, owned by the
//! client's single dispatch task. No locks.

use sketchwire_protocol::{
    AnnouncementEvent, ChatEvent, ClientId, ErrorEvent, JoinHandshake,
    KeepAlive, ParticipantInfo, ParticipantState, RosterUpdate,
    SetWordToGuess, WordsToPick,
};
use tracing::{debug, info};

use crate::GameError;

/// One feed entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedItem {
    Chat(ChatEvent),
    Announcement(AnnouncementEvent),
}

/// Who the local participant is. Fixed for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalParticipant {
    pub name: String,
    pub client_id: ClientId,
    pub room_name: String,
}

/// Aggregated session state.
#[derive(Debug)]
pub struct SessionAggregator {
    local: LocalParticipant,
    feed: Vec<FeedItem>,
    roster: Vec<ParticipantInfo>,
    participant_state: Option<ParticipantState>,
    words_to_pick: Vec<String>,
    last_error: Option<ErrorEvent>,
}

impl SessionAggregator {
    pub fn new(local: LocalParticipant) -> Self {
        Self {
            local,
            feed: Vec::new(),
            roster: Vec::new(),
            participant_state: None,
            words_to_pick: Vec::new(),
            last_error: None,
        }
    }

    pub fn local(&self) -> &LocalParticipant {
        &self.local
    }

    // -- Feed -----------------------------------------------------------

    /// Appends a feed entry. Entries are never reordered or deduplicated:
    /// the server's order is the feed's order.
    pub fn append(&mut self, item: FeedItem) {
        self.feed.push(item);
    }

    /// All feed entries, oldest first.
    pub fn feed(&self) -> &[FeedItem] {
        &self.feed
    }

    // -- Roster & participant state ---------------------------------------

    /// Replaces the roster with the server's latest snapshot.
    pub fn set_roster(&mut self, update: RosterUpdate) {
        debug!(participants = update.participants.len(), "roster updated");
        self.roster = update.participants;
    }

    /// The latest roster, in the server's ranking order.
    pub fn current_roster(&self) -> &[ParticipantInfo] {
        &self.roster
    }

    pub fn set_participant_state(&mut self, state: ParticipantState) {
        self.participant_state = Some(state);
        info!(
            drawing = self.is_local_participant_drawing(),
            "participant state updated"
        );
    }

    pub fn participant_state(&self) -> Option<&ParticipantState> {
        self.participant_state.as_ref()
    }

    /// Whether the local participant holds drawing rights.
    ///
    /// Decided by client id, never by display name: two participants can
    /// share a name.
    pub fn is_local_participant_drawing(&self) -> bool {
        self.participant_state
            .as_ref()
            .and_then(|s| s.drawing_participant_id.as_ref())
            .is_some_and(|id| *id == self.local.client_id)
    }

    // -- Word selection -------------------------------------------------

    /// Records the words the server offers to the local participant.
    pub fn offer_words(&mut self, offer: WordsToPick) {
        debug!(count = offer.words.len(), "words offered");
        self.words_to_pick = offer.words;
    }

    pub fn words_to_pick(&self) -> &[String] {
        &self.words_to_pick
    }

    /// Drops an unanswered offer, e.g. once the server picked for us.
    pub fn withdraw_words(&mut self) {
        if !self.words_to_pick.is_empty() {
            debug!(count = self.words_to_pick.len(), "word offer withdrawn");
            self.words_to_pick.clear();
        }
    }

    /// Builds the message choosing `word` and withdraws the offer.
    ///
    /// # Errors
    /// - [`GameError::NotDrawingParticipant`] when no words are on offer.
    /// - [`GameError::WordNotOffered`] when `word` is not one of them.
    pub fn pick_word(&mut self, word: &str) -> Result<SetWordToGuess, GameError> {
        if self.words_to_pick.is_empty() {
            return Err(GameError::NotDrawingParticipant);
        }
        if !self.words_to_pick.iter().any(|w| w == word) {
            return Err(GameError::WordNotOffered(word.to_owned()));
        }
        self.words_to_pick.clear();
        info!(word, "word picked");
        Ok(SetWordToGuess {
            word_to_guess: word.to_owned(),
            room_name: self.local.room_name.clone(),
        })
    }

    // -- Outbound messages ----------------------------------------------

    /// Builds a chat message from the local participant.
    ///
    /// # Errors
    /// [`GameError::EmptyChatMessage`] when `text` is blank.
    pub fn chat(&self, text: &str, timestamp: i64) -> Result<ChatEvent, GameError> {
        if text.trim().is_empty() {
            return Err(GameError::EmptyChatMessage);
        }
        Ok(ChatEvent {
            from_client_id: self.local.client_id.clone(),
            from_participant_name: self.local.name.clone(),
            room_name: self.local.room_name.clone(),
            message: text.to_owned(),
            timestamp,
        })
    }

    /// The first message of every (re)connect.
    pub fn join_handshake(&self) -> JoinHandshake {
        JoinHandshake {
            participant_name: self.local.name.clone(),
            room_name: self.local.room_name.clone(),
            client_id: self.local.client_id.clone(),
        }
    }

    /// The reply to a server keep-alive: our own, carrying our name.
    pub fn keep_alive_reply(&self) -> KeepAlive {
        KeepAlive {
            participant_name: Some(self.local.name.clone()),
        }
    }

    // -- Errors & lifecycle ---------------------------------------------

    pub fn record_error(&mut self, error: ErrorEvent) {
        self.last_error = Some(error);
    }

    pub fn last_error(&self) -> Option<&ErrorEvent> {
        self.last_error.as_ref()
    }

    /// Forgets round-scoped state when the connection drops. The feed and
    /// roster stay; the server resends participant state on rejoin.
    pub fn connection_lost(&mut self) {
        self.participant_state = None;
        self.words_to_pick.clear();
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use sketchwire_protocol::{AnnouncementKind, ErrorKind};

    use super::*;

    fn local() -> LocalParticipant {
        LocalParticipant {
            name: "ada".into(),
            client_id: ClientId::new("c-ada"),
            room_name: "lobby".into(),
        }
    }

    fn state_drawn_by(id: &str, name: &str) -> ParticipantState {
        ParticipantState {
            drawing_participant_name: Some(name.into()),
            drawing_participant_id: Some(ClientId::new(id)),
            word_to_guess: Some("apple".into()),
        }
    }

    fn announcement(message: &str) -> FeedItem {
        FeedItem::Announcement(AnnouncementEvent {
            message: message.into(),
            timestamp: 0,
            kind: AnnouncementKind::General,
        })
    }

    #[test]
    fn test_append_keeps_server_order_and_duplicates() {
        let mut agg = SessionAggregator::new(local());
        agg.append(announcement("b"));
        agg.append(announcement("a"));
        agg.append(announcement("a"));

        assert_eq!(
            agg.feed(),
            &[announcement("b"), announcement("a"), announcement("a")]
        );
    }

    #[test]
    fn test_set_roster_replaces_snapshot() {
        let mut agg = SessionAggregator::new(local());
        let row = |name: &str, rank| ParticipantInfo {
            name: name.into(),
            is_drawing: false,
            score: 0,
            rank,
        };
        agg.set_roster(RosterUpdate {
            participants: vec![row("ada", 1), row("bob", 2)],
        });
        agg.set_roster(RosterUpdate {
            participants: vec![row("bob", 1)],
        });

        assert_eq!(agg.current_roster(), &[row("bob", 1)]);
    }

    #[test]
    fn test_is_local_drawing_matches_by_client_id() {
        let mut agg = SessionAggregator::new(local());
        agg.set_participant_state(state_drawn_by("c-ada", "ada"));
        assert!(agg.is_local_participant_drawing());
    }

    #[test]
    fn test_is_local_drawing_ignores_same_name_other_id() {
        let mut agg = SessionAggregator::new(local());
        agg.set_participant_state(state_drawn_by("c-other", "ada"));
        assert!(!agg.is_local_participant_drawing());
    }

    #[test]
    fn test_is_local_drawing_without_state_is_false() {
        let agg = SessionAggregator::new(local());
        assert!(!agg.is_local_participant_drawing());
    }

    #[test]
    fn test_keep_alive_reply_carries_local_name() {
        let agg = SessionAggregator::new(local());
        assert_eq!(agg.keep_alive_reply().participant_name.as_deref(), Some("ada"));
    }

    #[test]
    fn test_pick_word_offered_word_builds_message() {
        let mut agg = SessionAggregator::new(local());
        agg.offer_words(WordsToPick {
            words: vec!["apple".into(), "pear".into()],
        });

        let msg = agg.pick_word("pear").unwrap();

        assert_eq!(msg.word_to_guess, "pear");
        assert_eq!(msg.room_name, "lobby");
        assert!(agg.words_to_pick().is_empty());
    }

    #[test]
    fn test_pick_word_not_offered_is_error() {
        let mut agg = SessionAggregator::new(local());
        agg.offer_words(WordsToPick {
            words: vec!["apple".into()],
        });

        let err = agg.pick_word("plum").unwrap_err();

        assert!(matches!(err, GameError::WordNotOffered(w) if w == "plum"));
        assert_eq!(agg.words_to_pick(), &["apple".to_owned()]);
    }

    #[test]
    fn test_pick_word_without_offer_is_not_drawing() {
        let mut agg = SessionAggregator::new(local());
        assert!(matches!(
            agg.pick_word("apple"),
            Err(GameError::NotDrawingParticipant)
        ));
    }

    #[test]
    fn test_withdraw_words_rejects_later_pick() {
        let mut agg = SessionAggregator::new(local());
        agg.offer_words(WordsToPick {
            words: vec!["pear".into()],
        });

        agg.withdraw_words();

        assert!(agg.words_to_pick().is_empty());
        assert_eq!(agg.pick_word("pear"), Err(GameError::NotDrawingParticipant));
    }

    #[test]
    fn test_chat_blank_text_is_error() {
        let agg = SessionAggregator::new(local());
        assert!(matches!(agg.chat("   \n", 0), Err(GameError::EmptyChatMessage)));
    }

    #[test]
    fn test_chat_builds_event_from_local_participant() {
        let agg = SessionAggregator::new(local());
        let chat = agg.chat("is it a cat?", 1_700_000_000_000).unwrap();

        assert_eq!(chat.from_client_id, ClientId::new("c-ada"));
        assert_eq!(chat.from_participant_name, "ada");
        assert_eq!(chat.room_name, "lobby");
        assert_eq!(chat.message, "is it a cat?");
    }

    #[test]
    fn test_join_handshake_identifies_local_participant() {
        let agg = SessionAggregator::new(local());
        let hs = agg.join_handshake();
        assert_eq!(hs.participant_name, "ada");
        assert_eq!(hs.room_name, "lobby");
        assert_eq!(hs.client_id, ClientId::new("c-ada"));
    }

    #[test]
    fn test_connection_lost_clears_round_state_keeps_feed() {
        let mut agg = SessionAggregator::new(local());
        agg.append(announcement("hi"));
        agg.set_participant_state(state_drawn_by("c-ada", "ada"));
        agg.offer_words(WordsToPick {
            words: vec!["apple".into()],
        });

        agg.connection_lost();

        assert!(!agg.is_local_participant_drawing());
        assert!(agg.words_to_pick().is_empty());
        assert_eq!(agg.feed().len(), 1);
    }

    #[test]
    fn test_record_error_keeps_last() {
        let mut agg = SessionAggregator::new(local());
        agg.record_error(ErrorEvent {
            kind: ErrorKind::RoomNotFound,
            detail: None,
        });
        assert_eq!(agg.last_error().map(|e| e.kind), Some(ErrorKind::RoomNotFound));
    }
}
