//! Scoring Engine
//!
//! Distance scoring. Lower is better; 0 is a perfect guess.

use crate::FALLBACK_SCORE;
use crate::game::state::{Guess, GroupRound, PlayerId, Submission};

/// Score a guess against a target.
///
/// An absent guess scores [`FALLBACK_SCORE`].
#[inline]
pub fn score(guess: Option<Guess>, target: u8) -> u32 {
    match guess {
        Some(guess) => (guess.value() as i32 - target as i32).unsigned_abs(),
        None => FALLBACK_SCORE,
    }
}

/// Score derived from a player's submission state.
///
/// `NotSubmitted` has no score. A timed-out player always gets the fallback
/// score, whatever was sent before.
#[inline]
pub fn score_submission(submission: &Submission, target: u8) -> Option<u32> {
    match submission {
        Submission::NotSubmitted => None,
        Submission::Submitted { guess } => Some(score(Some(*guess), target)),
        Submission::TimedOut => Some(score(None, target)),
    }
}

/// Sum of per-round scores.
pub fn total_score<I: IntoIterator<Item = u32>>(scores: I) -> u32 {
    scores.into_iter().sum()
}

/// Cumulative score of a player over the given rounds, summed from the
/// stored per-round scores.
///
/// `None` if the player is missing from a round or a round is unscored.
pub fn cumulative_total(rounds: &[GroupRound], player: &PlayerId) -> Option<u32> {
    let scores: Option<Vec<u32>> = rounds.iter()
        .map(|round| round.player(player).and_then(|p| p.score))
        .collect();
    scores.map(total_score)
}
