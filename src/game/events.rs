//! Round Events
//!
//! Audit trail of what happened to each group round, in the order it
//! happened. Drained by the session and included in the export.

use serde::{Serialize, Deserialize};
use crate::game::state::{GroupId, PlayerId, RoundNumber};

/// What happened.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundEventKind {
    /// Round opened for submissions
    RoundOpened {
        /// Target drawn for the round.
        target: u8,
    },

    /// A valid guess was recorded
    GuessRecorded {
        /// Submitter.
        player_id: PlayerId,
        /// Accepted guess.
        guess: u8,
        /// Distance to the target.
        score: u32,
    },

    /// Submission refused (invalid, late, or duplicate)
    SubmissionRejected {
        /// Submitter.
        player_id: PlayerId,
        /// Rejection message.
        reason: String,
    },

    /// Timeout fallback applied to a player
    FallbackApplied {
        /// Player who did not guess in time.
        player_id: PlayerId,
    },

    /// Target was missing at scoring time and generated then
    TargetBackfilled {
        /// Target generated late.
        target: u8,
    },

    /// Round ranked and results produced
    RoundCompleted {
        /// Whether this was the last round.
        is_final: bool,
    },

    /// A second completion trigger found the round already completing
    DuplicateCompletionIgnored,

    /// Stored state differed from its re-derivation and was rewritten
    StateRepaired {
        /// Round that was rewritten.
        round: RoundNumber,
    },
}

/// An event tagged with its group and round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundEvent {
    /// Group
    pub group_id: GroupId,

    /// Round
    pub round: RoundNumber,

    /// Player involved, if any
    pub player_id: Option<PlayerId>,

    /// Event data
    pub kind: RoundEventKind,
}

impl RoundEvent {
    /// Create a new event.
    pub fn new(group_id: GroupId, round: RoundNumber, kind: RoundEventKind) -> Self {
        let player_id = match &kind {
            RoundEventKind::GuessRecorded { player_id, .. } => Some(*player_id),
            RoundEventKind::SubmissionRejected { player_id, .. } => Some(*player_id),
            RoundEventKind::FallbackApplied { player_id } => Some(*player_id),
            _ => None,
        };

        Self {
            group_id,
            round,
            player_id,
            kind,
        }
    }

    /// Whether this event records a recovered anomaly.
    pub fn is_anomaly(&self) -> bool {
        matches!(
            self.kind,
            RoundEventKind::TargetBackfilled { .. }
                | RoundEventKind::DuplicateCompletionIgnored
                | RoundEventKind::StateRepaired { .. }
        )
    }
}
