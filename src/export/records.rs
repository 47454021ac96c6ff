//! Export Records
//!
//! Flat per-player rows handed to the persistence collaborator. One row
//! per (group, round, player) plus one total row per player.

use serde::{Serialize, Deserialize};

use crate::core::hash::DigestHasher;
use crate::game::coordinator::GroupCoordinator;
use crate::game::scoring::cumulative_total;
use crate::game::state::{GroupId, GroupRound, PlayerId, RoundNumber};

/// One player's outcome in one round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRoundRecord {
    /// Group
    pub group_id: GroupId,
    /// Round
    pub round: RoundNumber,
    /// Player
    pub player_id: PlayerId,
    /// Position in the group
    pub id_in_group: u32,
    /// Pinned display name
    pub name: String,
    /// Round target, if one was drawn
    pub target: Option<u8>,
    /// Submitted guess
    pub guess: Option<u8>,
    /// Whether a guess or the fallback was recorded
    pub has_submitted: bool,
    /// Whether the timeout fallback applied
    pub is_fallback: bool,
    /// Round score
    pub score: Option<u32>,
    /// Round rank
    pub rank: Option<u32>,
    /// Cumulative score through this round
    pub total_score: Option<u32>,
    /// Rank by total (last round only)
    pub final_rank: Option<u32>,
}

impl PlayerRoundRecord {
    /// Rows for every player of a round, in registry order.
    pub fn from_round(round: &GroupRound) -> Vec<Self> {
        round.players.iter()
            .map(|p| Self {
                group_id: round.group_id,
                round: round.round,
                player_id: p.player_id,
                id_in_group: p.id_in_group,
                name: p.display_name.clone(),
                target: round.target,
                guess: p.guess().map(|g| g.value()),
                has_submitted: p.has_submitted(),
                is_fallback: p.is_fallback(),
                score: p.score,
                rank: p.rank,
                total_score: p.total_score,
                final_rank: p.final_rank,
            })
            .collect()
    }

    /// Feed this row into a digest. Field order is fixed.
    pub fn digest_into(&self, hasher: &mut DigestHasher) {
        hasher.update_u32(self.group_id);
        hasher.update_u32(self.round);
        hasher.update_uuid(self.player_id.as_bytes());
        hasher.update_u32(self.id_in_group);
        hasher.update_str(&self.name);
        hasher.update_opt_u32(self.target.map(u32::from));
        hasher.update_opt_u32(self.guess.map(u32::from));
        hasher.update_bool(self.has_submitted);
        hasher.update_bool(self.is_fallback);
        hasher.update_opt_u32(self.score);
        hasher.update_opt_u32(self.rank);
        hasher.update_opt_u32(self.total_score);
        hasher.update_opt_u32(self.final_rank);
    }
}

/// One player's session total.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerTotalRecord {
    /// Group
    pub group_id: GroupId,
    /// Player
    pub player_id: PlayerId,
    /// Position in the group
    pub id_in_group: u32,
    /// Pinned display name
    pub name: String,
    /// Rounds closed for this group
    pub rounds_played: u32,
    /// Sum of stored round scores; `None` if a round is unscored
    pub total_score: Option<u32>,
    /// Rank by total, once the last round has closed
    pub final_rank: Option<u32>,
}

impl PlayerTotalRecord {
    /// Totals for every member of a group, re-summed from stored scores.
    pub fn from_coordinator(coordinator: &GroupCoordinator) -> Vec<Self> {
        let rounds = coordinator.rounds();
        let last = coordinator.round(coordinator.num_rounds());

        coordinator.members().iter()
            .map(|m| Self {
                group_id: coordinator.group_id(),
                player_id: m.player_id,
                id_in_group: m.id_in_group,
                name: m.display_name.clone(),
                rounds_played: rounds.len() as u32,
                total_score: cumulative_total(rounds, &m.player_id),
                final_rank: last
                    .and_then(|r| r.player(&m.player_id))
                    .and_then(|p| p.final_rank),
            })
            .collect()
    }

    /// Feed this row into a digest. Field order is fixed.
    pub fn digest_into(&self, hasher: &mut DigestHasher) {
        hasher.update_u32(self.group_id);
        hasher.update_uuid(self.player_id.as_bytes());
        hasher.update_u32(self.id_in_group);
        hasher.update_str(&self.name);
        hasher.update_u32(self.rounds_played);
        hasher.update_opt_u32(self.total_score);
        hasher.update_opt_u32(self.final_rank);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use crate::game::registry::GroupMember;
    use crate::game::target::FixedTargets;

    fn finished_group() -> GroupCoordinator {
        let members: Vec<GroupMember> = (1..=2u8)
            .map(|i| GroupMember {
                player_id: PlayerId::new([i; 16]),
                id_in_group: i as u32,
                display_name: format!("Player {}", i),
            })
            .collect();
        let mut coord = GroupCoordinator::new(1, members, 2, Arc::new(FixedTargets::new(50)));

        coord.start_round(1).unwrap();
        coord.submit(PlayerId::new([1; 16]), 45).unwrap();
        coord.timeout(1).unwrap();
        coord.start_round(2).unwrap();
        coord.submit(PlayerId::new([1; 16]), 50).unwrap();
        coord.submit(PlayerId::new([2; 16]), 60).unwrap();
        coord
    }

    #[test]
    fn test_round_rows() {
        let coord = finished_group();
        let rows = PlayerRoundRecord::from_round(coord.round(1).unwrap());

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].guess, Some(45));
        assert_eq!(rows[0].score, Some(5));
        assert!(rows[1].is_fallback);
        assert_eq!(rows[1].guess, None);
        assert_eq!(rows[1].score, Some(100));
        assert_eq!(rows[1].final_rank, None);
    }

    #[test]
    fn test_total_rows() {
        let coord = finished_group();
        let totals = PlayerTotalRecord::from_coordinator(&coord);

        assert_eq!(totals[0].total_score, Some(5));
        assert_eq!(totals[0].final_rank, Some(1));
        assert_eq!(totals[1].total_score, Some(110));
        assert_eq!(totals[1].final_rank, Some(2));
        assert!(totals.iter().all(|t| t.rounds_played == 2));
    }

    #[test]
    fn test_digest_sensitive_to_scores() {
        let coord = finished_group();
        let rows = PlayerRoundRecord::from_round(coord.round(2).unwrap());

        let digest = |rows: &[PlayerRoundRecord]| {
            let mut hasher = DigestHasher::for_export();
            rows.iter().for_each(|r| r.digest_into(&mut hasher));
            hasher.finalize()
        };

        let mut tampered = rows.clone();
        tampered[1].score = Some(0);
        assert_eq!(digest(&rows), digest(&rows));
        assert_ne!(digest(&rows), digest(&tampered));
    }
}
