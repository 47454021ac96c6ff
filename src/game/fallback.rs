//! Timeout Fallback Policy
//!
//! Players without a submission when the guess window closes get the
//! canonical worst result: no guess, score 100, flagged as fallback.

use crate::FALLBACK_SCORE;
use crate::game::state::{GroupRound, PlayerId, Submission};

/// Apply the fallback to every player who has not submitted.
///
/// Players who already submitted are untouched. Returns the players the
/// fallback was applied to, in registry order.
pub fn apply_timeout(round: &mut GroupRound) -> Vec<PlayerId> {
    let mut timed_out = Vec::new();

    for player in round.players.iter_mut().filter(|p| !p.has_submitted()) {
        player.submission = Submission::TimedOut;
        player.score = Some(FALLBACK_SCORE);
        timed_out.push(player.player_id);
    }

    timed_out
}
