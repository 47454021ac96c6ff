//! Round Re-derivation
//!
//! Every derived field of a round (score, rank, total, final rank) comes
//! from one pure function of the stored inputs: submissions, target, and
//! the earlier rounds' scores. The live submission path, the timeout path
//! and the render-time check all call it, so running it again on correct
//! data changes nothing.

use crate::game::ranking::{rank_final, rank_round};
use crate::game::scoring::{cumulative_total, score_submission};
use crate::game::state::{GroupRound, RoundPhase};

/// Derive a round's scores, ranks and totals from its inputs.
///
/// - `prior`: the group's earlier rounds, in order (rounds `1..round`).
/// - `num_rounds`: configured round count; final ranks are only derived
///   when `round.round == num_rounds`.
///
/// Submissions, target and phase are copied through unchanged. Ranks and
/// totals are only derived once the round has left `Open` with every
/// player scored; otherwise they are cleared.
pub fn recompute(round: &GroupRound, prior: &[GroupRound], num_rounds: u32) -> GroupRound {
    let mut derived = round.clone();

    for player in &mut derived.players {
        player.score = derived.target
            .and_then(|target| score_submission(&player.submission, target));
        player.rank = None;
        player.total_score = None;
        player.final_rank = None;
    }

    if derived.phase == RoundPhase::Open {
        return derived;
    }

    let Some(ranks) = rank_round(&derived) else {
        return derived;
    };
    for (player_id, rank) in ranks {
        if let Some(player) = derived.player_mut(&player_id) {
            player.rank = Some(rank);
        }
    }

    for player in &mut derived.players {
        player.total_score = match (cumulative_total(prior, &player.player_id), player.score) {
            (Some(before), Some(score)) => Some(before + score),
            _ => None,
        };
    }

    if let Some(final_ranks) = rank_final(&derived, num_rounds) {
        for (player_id, rank) in final_ranks {
            if let Some(player) = derived.player_mut(&player_id) {
                player.final_rank = Some(rank);
            }
        }
    }

    #[cfg(feature = "debug-tracing")]
    tracing::trace!(
        "Recomputed group {} round {}: {:?}",
        derived.group_id,
        derived.round,
        derived.players.iter().map(|p| (p.id_in_group, p.score, p.rank)).collect::<Vec<_>>()
    );

    derived
}
