//! Error types for the game layer.

/// Errors that can occur when the local participant acts on game state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    /// The action is reserved for the drawing participant.
    #[error("only the drawing participant can do this")]
    NotDrawingParticipant,

    /// The picked word is not one of the words on offer.
    #[error("word {0:?} was not offered")]
    WordNotOffered(String),

    /// Chat text was empty or whitespace.
    #[error("chat message is empty")]
    EmptyChatMessage,
}
