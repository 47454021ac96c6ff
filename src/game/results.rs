//! Result Payloads
//!
//! Read models built from closed rounds: the submitter's acknowledgement,
//! the per-round group results, and the final standings.

use serde::{Serialize, Deserialize};

use crate::game::state::{GroupId, GroupRound, PlayerId, RoundNumber};

/// Direct acknowledgement for the submitting player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitAck {
    /// Submitter
    pub player_id: PlayerId,
    /// Accepted guess
    pub guess: u8,
    /// Score against the round target
    pub score: u32,
}

/// One row of the round results.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerResult {
    /// Position in the group
    pub id: u32,
    /// Player identifier
    pub player_id: PlayerId,
    /// Pinned display name
    pub name: String,
    /// Guess, `None` for a fallback
    pub guess: Option<u8>,
    /// Round score
    pub score: u32,
    /// Round rank
    pub rank: u32,
    /// Whether the timeout fallback applied
    pub is_fallback: bool,
    /// Cumulative score through this round
    pub total_score: u32,
}

/// Results of one group round, ordered by rank.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundResults {
    /// Group
    pub group_id: GroupId,
    /// Round
    pub round_number: RoundNumber,
    /// Configured round count
    pub total_rounds: u32,
    /// Revealed target
    pub target_number: u8,
    /// Rows in rank order
    pub players: Vec<PlayerResult>,
}

impl RoundResults {
    /// Build from a ranked round. `None` unless every row is complete.
    pub fn from_round(round: &GroupRound, total_rounds: u32) -> Option<Self> {
        let target_number = round.target?;
        if !round.is_fully_ranked() {
            return None;
        }

        let players = round.players_by_rank()
            .into_iter()
            .map(|p| {
                Some(PlayerResult {
                    id: p.id_in_group,
                    player_id: p.player_id,
                    name: p.display_name.clone(),
                    guess: p.guess().map(|g| g.value()),
                    score: p.score?,
                    rank: p.rank?,
                    is_fallback: p.is_fallback(),
                    total_score: p.total_score?,
                })
            })
            .collect::<Option<Vec<_>>>()?;

        Some(Self {
            group_id: round.group_id,
            round_number: round.round,
            total_rounds,
            target_number,
            players,
        })
    }

    /// Row of a given player.
    pub fn player(&self, id: &PlayerId) -> Option<&PlayerResult> {
        self.players.iter().find(|p| p.player_id == *id)
    }
}

/// One row of the final standings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStanding {
    /// Position in the group
    pub id: u32,
    /// Player identifier
    pub player_id: PlayerId,
    /// Pinned display name
    pub name: String,
    /// Sum over all rounds
    pub total_score: u32,
    /// Rank by total
    pub final_rank: u32,
}

/// Final standings of a group, ordered by final rank.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalStandings {
    /// Group
    pub group_id: GroupId,
    /// Configured round count
    pub total_rounds: u32,
    /// Rows in final-rank order
    pub players: Vec<PlayerStanding>,
}

impl FinalStandings {
    /// Build from the last round. `None` until final ranks exist.
    pub fn from_round(round: &GroupRound, total_rounds: u32) -> Option<Self> {
        if round.round != total_rounds {
            return None;
        }

        let mut players = round.players.iter()
            .map(|p| {
                Some(PlayerStanding {
                    id: p.id_in_group,
                    player_id: p.player_id,
                    name: p.display_name.clone(),
                    total_score: p.total_score?,
                    final_rank: p.final_rank?,
                })
            })
            .collect::<Option<Vec<_>>>()?;
        players.sort_by_key(|p| p.final_rank);

        Some(Self {
            group_id: round.group_id,
            total_rounds,
            players,
        })
    }

    /// Group winner (final rank 1).
    pub fn winner(&self) -> Option<&PlayerStanding> {
        self.players.first()
    }
}
