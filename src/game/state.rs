//! Round State Definitions
//!
//! All state types for one group's rounds.
//! Players are kept in registry order (`id_in_group`), which is also the
//! tie-break order used by ranking.

use std::fmt;
use serde::{Serialize, Deserialize, Serializer, Deserializer};

use crate::{GUESS_MIN, GUESS_MAX};
use crate::game::registry::GroupMember;

/// Group identifier, 1-based and stable for the whole session.
pub type GroupId = u32;

/// Round number, 1-based.
pub type RoundNumber = u32;

// =============================================================================
// PLAYER ID
// =============================================================================

/// Unique player identifier (UUID as bytes).
///
/// Implements Ord for deterministic BTreeMap ordering. Serializes as a UUID
/// string in human-readable formats and as raw bytes otherwise.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PlayerId(pub [u8; 16]);

impl PlayerId {
    /// Create from raw bytes.
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    /// Short hex prefix, enough to tell players apart in logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0[..4]))
    }
}

impl Serialize for PlayerId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        uuid::Uuid::from_bytes(self.0).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PlayerId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        uuid::Uuid::deserialize(deserializer).map(|u| Self(*u.as_bytes()))
    }
}

// =============================================================================
// GUESS
// =============================================================================

/// A validated guess in `GUESS_MIN..=GUESS_MAX`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Guess(u8);

/// Raw guess rejected by validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Your guess must be between {min} and {max} (got {0}).", min = GUESS_MIN, max = GUESS_MAX)]
pub struct GuessOutOfRange(pub i64);

impl Guess {
    /// Validate a raw guess.
    pub fn new(value: i64) -> Result<Self, GuessOutOfRange> {
        if value < GUESS_MIN as i64 || value > GUESS_MAX as i64 {
            return Err(GuessOutOfRange(value));
        }
        Ok(Self(value as u8))
    }

    /// Guess value.
    #[inline]
    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Guess {
    type Error = GuessOutOfRange;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Guess> for u8 {
    fn from(guess: Guess) -> u8 {
        guess.0
    }
}

// =============================================================================
// SUBMISSION STATE
// =============================================================================

/// What a player contributed to a round.
///
/// Score is derived from this, never stored as a sentinel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Submission {
    /// Nothing recorded yet.
    #[default]
    NotSubmitted,
    /// Real guess submitted within the window.
    Submitted {
        /// The recorded guess.
        guess: Guess,
    },
    /// Window elapsed without a guess; fallback applied.
    TimedOut,
}

impl Submission {
    /// Guess, if the player actually submitted one.
    pub fn guess(&self) -> Option<Guess> {
        match self {
            Submission::Submitted { guess } => Some(*guess),
            Submission::NotSubmitted | Submission::TimedOut => None,
        }
    }

    /// True once a guess is recorded or the fallback was applied.
    pub fn has_submitted(&self) -> bool {
        !matches!(self, Submission::NotSubmitted)
    }

    /// True if the result came from the timeout policy.
    pub fn is_fallback(&self) -> bool {
        matches!(self, Submission::TimedOut)
    }
}

// =============================================================================
// ROUND PHASE
// =============================================================================

/// Per (group, round) coordination phase. Transitions only move forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhase {
    /// Accepting submissions.
    Open,
    /// Everyone has submitted, ranking in progress.
    Completing,
    /// Ranked and broadcast.
    Closed,
}

// =============================================================================
// PLAYER ROUND
// =============================================================================

/// State of a single player in one round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRound {
    /// Unique player ID
    pub player_id: PlayerId,

    /// Stable 1-based position in the group
    pub id_in_group: u32,

    /// Name pinned by the registry
    pub display_name: String,

    /// Submission state
    pub submission: Submission,

    /// Distance score; `None` until scored
    pub score: Option<u32>,

    /// Dense rank within the group for this round
    pub rank: Option<u32>,

    /// Sum of scores for rounds 1..=this round
    pub total_score: Option<u32>,

    /// Rank by total, last round only
    pub final_rank: Option<u32>,
}

impl PlayerRound {
    /// Create a defaulted player-round from a registry member.
    pub fn new(member: &GroupMember) -> Self {
        Self {
            player_id: member.player_id,
            id_in_group: member.id_in_group,
            display_name: member.display_name.clone(),
            submission: Submission::NotSubmitted,
            score: None,
            rank: None,
            total_score: None,
            final_rank: None,
        }
    }

    /// Recorded guess, if any.
    pub fn guess(&self) -> Option<Guess> {
        self.submission.guess()
    }

    /// See [`Submission::has_submitted`].
    pub fn has_submitted(&self) -> bool {
        self.submission.has_submitted()
    }

    /// See [`Submission::is_fallback`].
    pub fn is_fallback(&self) -> bool {
        self.submission.is_fallback()
    }
}

// =============================================================================
// GROUP ROUND
// =============================================================================

/// One group's state for one round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRound {
    /// Owning group
    pub group_id: GroupId,

    /// Round number (1-based)
    pub round: RoundNumber,

    /// Hidden target in [0, 100]
    pub target: Option<u8>,

    /// Set when the target had to be generated at scoring time
    pub target_backfilled: bool,

    /// Coordination phase
    pub phase: RoundPhase,

    /// Players in `id_in_group` order
    pub players: Vec<PlayerRound>,
}

impl GroupRound {
    /// Create an open round with defaulted player state.
    pub fn new(group_id: GroupId, round: RoundNumber, members: &[GroupMember]) -> Self {
        Self {
            group_id,
            round,
            target: None,
            target_backfilled: false,
            phase: RoundPhase::Open,
            players: members.iter().map(PlayerRound::new).collect(),
        }
    }

    /// Get a player by ID.
    pub fn player(&self, id: &PlayerId) -> Option<&PlayerRound> {
        self.players.iter().find(|p| p.player_id == *id)
    }

    /// Get a player mutably by ID.
    pub fn player_mut(&mut self, id: &PlayerId) -> Option<&mut PlayerRound> {
        self.players.iter_mut().find(|p| p.player_id == *id)
    }

    /// Whether every member has a recorded guess or fallback.
    pub fn all_submitted(&self) -> bool {
        self.players.iter().all(|p| p.has_submitted())
    }

    /// Players still owing a submission.
    pub fn pending_players(&self) -> Vec<PlayerId> {
        self.players.iter()
            .filter(|p| !p.has_submitted())
            .map(|p| p.player_id)
            .collect()
    }

    /// Count of players with a recorded submission.
    pub fn submitted_count(&self) -> usize {
        self.players.iter().filter(|p| p.has_submitted()).count()
    }

    /// Whether ranks form exactly {1..=group_size}.
    pub fn is_fully_ranked(&self) -> bool {
        crate::game::ranking::is_dense(self.players.iter().map(|p| p.rank), self.players.len())
    }

    /// Players ordered by round rank (unranked players last, registry order).
    pub fn players_by_rank(&self) -> Vec<&PlayerRound> {
        let mut players: Vec<&PlayerRound> = self.players.iter().collect();
        players.sort_by_key(|p| (p.rank.unwrap_or(u32::MAX), p.id_in_group));
        players
    }
}

// =============================================================================
// TESTS
// =============================================================================
