//! Integration tests for the game layer: the phase machine and the
//! session aggregator following a whole round together.

use sketchwire_game::{
    CountdownCommand, FeedItem, GameError, LocalParticipant, PhaseMachine,
    SessionAggregator,
};
use sketchwire_protocol::{
    AnnouncementEvent, AnnouncementKind, ClientId, ParticipantState, Phase,
    PhaseUpdate, WordsToPick,
};

fn participant(name: &str) -> LocalParticipant {
    LocalParticipant {
        name: name.into(),
        client_id: ClientId::new(format!("c-{name}")),
        room_name: "lobby".into(),
    }
}

fn drawn_by(name: &str) -> ParticipantState {
    ParticipantState {
        drawing_participant_name: Some(name.into()),
        drawing_participant_id: Some(ClientId::new(format!("c-{name}"))),
        word_to_guess: Some("_____".into()),
    }
}

#[test]
fn test_round_lifecycle_flags_follow_server_phases() {
    let mut phase = PhaseMachine::new();
    let mut session = SessionAggregator::new(participant("ada"));

    // Lobby.
    let out = phase.apply(&PhaseUpdate::transition(Phase::WaitingForParticipants, 0));
    assert_eq!(out.countdown, CountdownCommand::Cancel);
    assert!(phase.flags().chat_enabled);
    assert!(!phase.flags().drawing_permitted);

    // Ada is chosen to draw and gets words.
    session.set_participant_state(drawn_by("ada"));
    let out = phase.apply(
        &PhaseUpdate::transition(Phase::RoundStarting, 10_000).with_drawing_participant("ada"),
    );
    assert!(out.clear_strokes);
    assert_eq!(phase.drawing_participant_name(), Some("ada"));
    session.offer_words(WordsToPick {
        words: vec!["apple".into(), "kite".into()],
    });
    phase.set_words_offered(true);
    assert!(phase.flags().pick_word_overlay_visible);

    let pick = session.pick_word("kite").unwrap();
    phase.set_words_offered(false);
    assert_eq!(pick.word_to_guess, "kite");
    assert!(!phase.flags().pick_word_overlay_visible);

    // Drawing.
    phase.apply(&PhaseUpdate::transition(Phase::RoundActive, 60_000));
    assert!(phase.flags().drawing_permitted && session.is_local_participant_drawing());
    phase.apply_countdown_tick(59_900);
    phase.apply(&PhaseUpdate::tick(59_000));
    assert_eq!(phase.countdown_millis(), Some(59_000));

    // Round over.
    let out = phase.apply(&PhaseUpdate::transition(Phase::RoundEnded, 5_000));
    assert!(out.finish_stroke);
    assert!(!phase.flags().drawing_permitted);
    session.append(FeedItem::Announcement(AnnouncementEvent {
        message: "The word was kite".into(),
        timestamp: 0,
        kind: AnnouncementKind::EveryoneGuessed,
    }));
    assert_eq!(session.feed().len(), 1);
}

#[test]
fn test_drawing_rights_are_exclusive_across_participants() {
    let names = ["ada", "bob", "cy"];
    let mut sessions: Vec<_> = names
        .iter()
        .map(|n| SessionAggregator::new(participant(n)))
        .collect();

    for drawer in names {
        for session in &mut sessions {
            session.set_participant_state(drawn_by(drawer));
        }
        let drawing: Vec<_> = sessions
            .iter()
            .filter(|s| s.is_local_participant_drawing())
            .map(|s| s.local().name.as_str())
            .collect();
        assert_eq!(drawing, vec![drawer]);
    }
}

#[test]
fn test_guesser_cannot_pick_words() {
    let mut session = SessionAggregator::new(participant("bob"));
    session.set_participant_state(drawn_by("ada"));

    assert_eq!(
        session.pick_word("apple"),
        Err(GameError::NotDrawingParticipant)
    );
}

#[test]
fn test_connection_loss_mid_round_resets_to_initial() {
    let mut phase = PhaseMachine::new();
    let mut session = SessionAggregator::new(participant("ada"));
    session.set_participant_state(drawn_by("ada"));
    phase.apply(&PhaseUpdate::transition(Phase::RoundActive, 30_000));

    let out = phase.connection_lost();
    session.connection_lost();

    assert_eq!(phase.phase(), Phase::Initial);
    assert_eq!(out.countdown, CountdownCommand::Cancel);
    assert!(!phase.flags().chat_enabled);
    assert!(!session.is_local_participant_drawing());
}
