//! Game state for Sketchwire: the phase state machine and the session
//! aggregator.
//!
//! Both components are synchronous and owned by the client's dispatch
//! loop. They consume server-authoritative messages and never decide game
//! rules themselves.
//!
//! # Key types
//!
//! - [`PhaseMachine`]: follows the server's phase and countdown, derives
//!   [`PhaseFlags`], and reports what the caller must do
//!   ([`PhaseOutcome`])
//! - [`SessionAggregator`]: feed, roster, participant state, word offers,
//!   and the outbound messages that speak for the local participant
//! - [`GameError`]: rejected local actions

mod aggregator;
mod error;
mod phase;

pub use aggregator::{FeedItem, LocalParticipant, SessionAggregator};
pub use error::GameError;
pub use phase::{
    CountdownCommand, PhaseFlags, PhaseMachine, PhaseOutcome, PhaseTransition,
};
