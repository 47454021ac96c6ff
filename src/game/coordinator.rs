//! Round Coordinator
//!
//! Owns every round of one group and drives each through
//! `Open -> Completing -> Closed`. All mutation goes through `&mut self`,
//! so the caller's per-group lock is the only synchronization needed:
//! completion is decided inside it and fires exactly once per round.

use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::game::events::{RoundEvent, RoundEventKind};
use crate::game::fallback::apply_timeout;
use crate::game::recompute::recompute;
use crate::game::registry::GroupMember;
use crate::game::results::{FinalStandings, RoundResults, SubmitAck};
use crate::game::scoring::{cumulative_total, score_submission};
use crate::game::state::{
    GroupId, GroupRound, Guess, GuessOutOfRange, PlayerId, RoundNumber, RoundPhase, Submission,
};
use crate::game::target::{ensure_target, TargetGenerator};

// =============================================================================
// ERRORS
// =============================================================================

/// Errors returned to the caller of a coordinator operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinatorError {
    /// Guess outside the accepted range. The player is not marked.
    #[error(transparent)]
    InvalidGuess(#[from] GuessOutOfRange),

    /// The round no longer accepts submissions.
    #[error("round {0} is closed for submissions")]
    LateSubmission(RoundNumber),

    /// Player already has a guess (or fallback) for this round.
    #[error("player {player} already submitted for round {round}")]
    AlreadySubmitted {
        /// Player
        player: PlayerId,
        /// Round
        round: RoundNumber,
    },

    /// Player is not a member of this group.
    #[error("player {player} is not in group {group}")]
    PlayerNotInGroup {
        /// Player
        player: PlayerId,
        /// Group
        group: GroupId,
    },

    /// No round has been opened yet.
    #[error("no round has been started")]
    RoundNotStarted,

    /// Rounds must start in order, each after the previous one closed.
    #[error("round {round} cannot start while the group is at round {current}")]
    RoundOutOfOrder {
        /// Requested round
        round: RoundNumber,
        /// Latest started round (0 if none)
        current: RoundNumber,
    },

    /// Round number beyond the configured count.
    #[error("round {round} is outside 1..={num_rounds}")]
    RoundOutOfRange {
        /// Requested round
        round: RoundNumber,
        /// Configured round count
        num_rounds: u32,
    },

    /// Round has not been started.
    #[error("round {0} has not been started")]
    UnknownRound(RoundNumber),
}

/// Rejected submissions recorded per player and round. Later rejections
/// are still returned to the caller but leave no audit event.
pub const MAX_REJECTION_EVENTS: u32 = 3;

// =============================================================================
// OUTCOMES
// =============================================================================

/// Payloads produced when a round closes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Completion {
    /// Group results for the round
    pub results: RoundResults,
    /// Final standings, on the last round only
    pub final_standings: Option<FinalStandings>,
}

/// Result of an accepted submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmitOutcome {
    /// Direct acknowledgement for the submitter
    pub ack: SubmitAck,
    /// Set when this submission completed the round
    pub completion: Option<Completion>,
}

// =============================================================================
// COORDINATOR
// =============================================================================

/// Coordinates all rounds of one group.
pub struct GroupCoordinator {
    group_id: GroupId,
    members: Vec<GroupMember>,
    num_rounds: u32,
    targets: Arc<dyn TargetGenerator>,
    /// Index `i` holds round `i + 1`.
    rounds: Vec<GroupRound>,
    events: Vec<RoundEvent>,
    rejections: BTreeMap<(RoundNumber, PlayerId), u32>,
}

impl GroupCoordinator {
    /// Create a coordinator for a registered group.
    pub fn new(
        group_id: GroupId,
        members: Vec<GroupMember>,
        num_rounds: u32,
        targets: Arc<dyn TargetGenerator>,
    ) -> Self {
        Self {
            group_id,
            members,
            num_rounds,
            targets,
            rounds: Vec::with_capacity(num_rounds as usize),
            events: Vec::new(),
            rejections: BTreeMap::new(),
        }
    }

    /// Group id.
    pub fn group_id(&self) -> GroupId {
        self.group_id
    }

    /// Registered members in `id_in_group` order.
    pub fn members(&self) -> &[GroupMember] {
        &self.members
    }

    /// Configured round count.
    pub fn num_rounds(&self) -> u32 {
        self.num_rounds
    }

    /// Latest started round number (0 before round 1).
    pub fn current_round(&self) -> RoundNumber {
        self.rounds.len() as RoundNumber
    }

    /// Whether the last round has closed.
    pub fn is_finished(&self) -> bool {
        self.rounds.len() as u32 == self.num_rounds
            && self.rounds.last().map(|r| r.phase) == Some(RoundPhase::Closed)
    }

    /// Stored state of a round.
    pub fn round(&self, round: RoundNumber) -> Option<&GroupRound> {
        round.checked_sub(1).and_then(|i| self.rounds.get(i as usize))
    }

    /// All started rounds in order.
    pub fn rounds(&self) -> &[GroupRound] {
        &self.rounds
    }

    /// Drain the event log.
    pub fn take_events(&mut self) -> Vec<RoundEvent> {
        std::mem::take(&mut self.events)
    }

    // =========================================================================
    // ROUND LIFECYCLE
    // =========================================================================

    /// Open `round`. The previous round must be closed.
    ///
    /// Returns the round's target.
    pub fn start_round(&mut self, round: RoundNumber) -> Result<u8, CoordinatorError> {
        if round == 0 || round > self.num_rounds {
            return Err(CoordinatorError::RoundOutOfRange {
                round,
                num_rounds: self.num_rounds,
            });
        }

        let current = self.current_round();
        let previous_closed = self.rounds.last()
            .map_or(true, |r| r.phase == RoundPhase::Closed);
        if round != current + 1 || !previous_closed {
            return Err(CoordinatorError::RoundOutOfOrder { round, current });
        }

        let target = self.targets.generate(self.group_id, round);
        let mut state = GroupRound::new(self.group_id, round, &self.members);
        state.target = Some(target);
        self.rounds.push(state);

        self.emit(round, RoundEventKind::RoundOpened { target });
        info!(
            "Group {} round {}/{} opened for {} players",
            self.group_id, round, self.num_rounds, self.members.len()
        );

        Ok(target)
    }

    /// Record a guess for the current round.
    pub fn submit(
        &mut self,
        player: PlayerId,
        raw_guess: i64,
    ) -> Result<SubmitOutcome, CoordinatorError> {
        if !self.members.iter().any(|m| m.player_id == player) {
            return Err(CoordinatorError::PlayerNotInGroup {
                player,
                group: self.group_id,
            });
        }

        let index = self.rounds.len().checked_sub(1)
            .ok_or(CoordinatorError::RoundNotStarted)?;
        let round_number = index as RoundNumber + 1;

        let guess = match self.check_submission(index, &player, raw_guess) {
            Ok(guess) => guess,
            Err(e) => {
                debug!("Group {} round {}: rejected {}: {}", self.group_id, round_number, player, e);
                let count = self.rejections.entry((round_number, player)).or_insert(0);
                *count += 1;
                if *count <= MAX_REJECTION_EVENTS {
                    self.emit(round_number, RoundEventKind::SubmissionRejected {
                        player_id: player,
                        reason: e.to_string(),
                    });
                }
                return Err(e);
            }
        };

        let target = self.ensure_target(index);
        let round = &mut self.rounds[index];
        let submission = Submission::Submitted { guess };
        let score = score_submission(&submission, target).unwrap_or_default();
        if let Some(state) = round.player_mut(&player) {
            state.submission = submission;
            state.score = Some(score);
        }
        let submitted = round.submitted_count();

        self.emit(round_number, RoundEventKind::GuessRecorded {
            player_id: player,
            guess: guess.value(),
            score,
        });
        debug!(
            "Group {} round {}: {} guessed {} (score {}), {}/{} in",
            self.group_id, round_number, player, guess.value(), score,
            submitted, self.members.len()
        );

        Ok(SubmitOutcome {
            ack: SubmitAck {
                player_id: player,
                guess: guess.value(),
                score,
            },
            completion: self.try_complete(index),
        })
    }

    /// Close the guess window of `round`, applying the fallback to everyone
    /// who has not submitted.
    ///
    /// A no-op for a round that is already completing or closed.
    pub fn timeout(&mut self, round: RoundNumber) -> Result<Option<Completion>, CoordinatorError> {
        let index = self.index_of(round)?;
        if self.rounds[index].phase != RoundPhase::Open {
            debug!("Group {} round {}: timeout after close ignored", self.group_id, round);
            return Ok(None);
        }

        self.ensure_target(index);
        let timed_out = apply_timeout(&mut self.rounds[index]);
        if !timed_out.is_empty() {
            info!(
                "Group {} round {}: fallback applied to {} players",
                self.group_id, round, timed_out.len()
            );
        }
        for player_id in timed_out {
            self.emit(round, RoundEventKind::FallbackApplied { player_id });
        }

        Ok(self.try_complete(index))
    }

    /// Complete the round at `index` if everyone is in.
    ///
    /// The `Open -> Completing` transition is the guard: any later trigger
    /// finds the round past `Open` and returns `None`.
    fn try_complete(&mut self, index: usize) -> Option<Completion> {
        let round_number = index as RoundNumber + 1;
        if !self.rounds[index].all_submitted() {
            return None;
        }
        if self.rounds[index].phase != RoundPhase::Open {
            warn!("Group {} round {}: duplicate completion ignored", self.group_id, round_number);
            self.emit(round_number, RoundEventKind::DuplicateCompletionIgnored);
            return None;
        }

        self.rounds[index].phase = RoundPhase::Completing;
        self.ensure_target(index);

        let (prior, rest) = self.rounds.split_at_mut(index);
        let mut derived = recompute(&rest[0], prior, self.num_rounds);
        derived.phase = RoundPhase::Closed;
        rest[0] = derived;

        let is_final = round_number == self.num_rounds;
        self.emit(round_number, RoundEventKind::RoundCompleted { is_final });

        let round = &self.rounds[index];
        let Some(results) = RoundResults::from_round(round, self.num_rounds) else {
            warn!("Group {} round {}: closed without complete results", self.group_id, round_number);
            return None;
        };
        let final_standings = FinalStandings::from_round(round, self.num_rounds);

        info!(
            "Group {} round {} closed: target {}, winner {}",
            self.group_id,
            round_number,
            results.target_number,
            results.players.first().map(|p| p.name.as_str()).unwrap_or("-")
        );

        Some(Completion {
            results,
            final_standings,
        })
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Re-derive a closed round (and the closed rounds after it) from the
    /// stored inputs, writing back only what differs.
    ///
    /// Unresolved players of a closed round get the fallback first. Returns
    /// whether anything was repaired. Open rounds are left to the live path.
    pub fn defensive_recompute(&mut self, round: RoundNumber) -> Result<bool, CoordinatorError> {
        let start = self.index_of(round)?;
        let mut repaired = false;

        for index in start..self.rounds.len() {
            if self.rounds[index].phase == RoundPhase::Open {
                break;
            }
            let round_number = index as RoundNumber + 1;

            let mut candidate = self.rounds[index].clone();
            for player_id in apply_timeout(&mut candidate) {
                self.emit(round_number, RoundEventKind::FallbackApplied { player_id });
            }
            if candidate.target.is_none() {
                let target = ensure_target(&mut candidate, self.targets.as_ref());
                self.emit(round_number, RoundEventKind::TargetBackfilled { target });
            }

            let derived = recompute(&candidate, &self.rounds[..index], self.num_rounds);
            if derived != self.rounds[index] {
                warn!(
                    "Group {} round {}: stored state inconsistent with its inputs, repaired",
                    self.group_id, round_number
                );
                self.rounds[index] = derived;
                self.emit(round_number, RoundEventKind::StateRepaired { round: round_number });
                repaired = true;
            }
        }

        Ok(repaired)
    }

    /// Results of a closed round, re-derived before reading.
    ///
    /// `None` while the round is still open.
    pub fn results(&mut self, round: RoundNumber) -> Result<Option<RoundResults>, CoordinatorError> {
        self.defensive_recompute(round)?;
        let index = self.index_of(round)?;
        Ok(RoundResults::from_round(&self.rounds[index], self.num_rounds))
    }

    /// Final standings, once the last round has closed.
    pub fn final_standings(&mut self) -> Option<FinalStandings> {
        if self.current_round() != self.num_rounds {
            return None;
        }
        self.defensive_recompute(self.num_rounds).ok()?;
        self.rounds.last()
            .and_then(|r| FinalStandings::from_round(r, self.num_rounds))
    }

    /// Cumulative totals through `round`, summed from stored scores.
    ///
    /// Players with an unscored round are omitted.
    pub fn totals(&self, round: RoundNumber) -> Result<BTreeMap<PlayerId, u32>, CoordinatorError> {
        let index = self.index_of(round)?;
        let rounds = &self.rounds[..=index];

        Ok(self.members.iter()
            .filter_map(|m| cumulative_total(rounds, &m.player_id).map(|t| (m.player_id, t)))
            .collect())
    }

    // =========================================================================
    // HELPERS
    // =========================================================================

    fn index_of(&self, round: RoundNumber) -> Result<usize, CoordinatorError> {
        if round == 0 || round > self.num_rounds {
            return Err(CoordinatorError::RoundOutOfRange {
                round,
                num_rounds: self.num_rounds,
            });
        }
        let index = round as usize - 1;
        if index >= self.rounds.len() {
            return Err(CoordinatorError::UnknownRound(round));
        }
        Ok(index)
    }

    /// Submission checks, in order: open window, valid guess, first guess.
    fn check_submission(
        &self,
        index: usize,
        player: &PlayerId,
        raw_guess: i64,
    ) -> Result<Guess, CoordinatorError> {
        let round = &self.rounds[index];
        if round.phase != RoundPhase::Open {
            return Err(CoordinatorError::LateSubmission(round.round));
        }
        let guess = Guess::new(raw_guess)?;
        if round.player(player).is_some_and(|p| p.has_submitted()) {
            return Err(CoordinatorError::AlreadySubmitted {
                player: *player,
                round: round.round,
            });
        }
        Ok(guess)
    }

    fn ensure_target(&mut self, index: usize) -> u8 {
        let round = &mut self.rounds[index];
        let was_missing = round.target.is_none();
        let target = ensure_target(round, self.targets.as_ref());
        if was_missing {
            let round_number = round.round;
            self.emit(round_number, RoundEventKind::TargetBackfilled { target });
        }
        target
    }

    fn emit(&mut self, round: RoundNumber, kind: RoundEventKind) {
        self.events.push(RoundEvent::new(self.group_id, round, kind));
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::target::FixedTargets;

    const A: PlayerId = PlayerId::new([1; 16]);
    const B: PlayerId = PlayerId::new([2; 16]);
    const C: PlayerId = PlayerId::new([3; 16]);

    fn members() -> Vec<GroupMember> {
        [(A, "A"), (B, "B"), (C, "C")]
            .iter()
            .enumerate()
            .map(|(i, (id, name))| GroupMember {
                player_id: *id,
                id_in_group: i as u32 + 1,
                display_name: name.to_string(),
            })
            .collect()
    }

    fn coordinator(num_rounds: u32, targets: FixedTargets) -> GroupCoordinator {
        GroupCoordinator::new(1, members(), num_rounds, Arc::new(targets))
    }

    fn scenario() -> GroupCoordinator {
        coordinator(2, FixedTargets::new(50).with(1, 1, 42).with(1, 2, 10))
    }

    #[test]
    fn test_two_round_scenario() {
        let mut coord = scenario();
        assert_eq!(coord.start_round(1).unwrap(), 42);

        let out = coord.submit(A, 40).unwrap();
        assert_eq!(out.ack, SubmitAck { player_id: A, guess: 40, score: 2 });
        assert!(out.completion.is_none());

        let out = coord.submit(B, 50).unwrap();
        assert_eq!(out.ack.score, 8);
        assert!(out.completion.is_none());

        let done = coord.timeout(1).unwrap().unwrap();
        assert!(done.final_standings.is_none());
        let rows: Vec<_> = done.results.players.iter()
            .map(|p| (p.name.as_str(), p.guess, p.score, p.rank, p.is_fallback))
            .collect();
        assert_eq!(rows, vec![
            ("A", Some(40), 2, 1, false),
            ("B", Some(50), 8, 2, false),
            ("C", None, 100, 3, true),
        ]);

        assert_eq!(coord.start_round(2).unwrap(), 10);
        coord.submit(A, 15).unwrap();
        coord.submit(B, 0).unwrap();
        let done = coord.submit(C, 90).unwrap().completion.unwrap();

        let totals: Vec<_> = done.results.players.iter().map(|p| (p.id, p.total_score)).collect();
        assert_eq!(totals, vec![(1, 7), (2, 18), (3, 180)]);

        let standings = done.final_standings.unwrap();
        let finals: Vec<_> = standings.players.iter()
            .map(|p| (p.name.as_str(), p.total_score, p.final_rank))
            .collect();
        assert_eq!(finals, vec![("A", 7, 1), ("B", 18, 2), ("C", 180, 3)]);

        assert!(coord.is_finished());
        assert_eq!(coord.totals(1).unwrap()[&C], 100);
        assert_eq!(coord.totals(2).unwrap()[&C], 180);
        assert_eq!(coord.final_standings(), Some(standings));
    }

    #[test]
    fn test_zero_guess_on_zero_target() {
        let mut coord = coordinator(1, FixedTargets::new(0));
        coord.start_round(1).unwrap();

        let out = coord.submit(A, 0).unwrap();
        assert_eq!(out.ack.score, 0);
        assert!(coord.round(1).unwrap().player(&A).unwrap().has_submitted());

        coord.submit(B, 3).unwrap();
        let done = coord.submit(C, 0).unwrap().completion.unwrap();
        let a = done.results.player(&A).unwrap();
        assert_eq!((a.guess, a.score, a.rank, a.is_fallback), (Some(0), 0, 1, false));
        // Tie on 0: registry order decides.
        assert_eq!(done.results.player(&C).unwrap().rank, 2);
    }

    #[test]
    fn test_invalid_guess_does_not_mark_player() {
        let mut coord = scenario();
        coord.start_round(1).unwrap();

        for raw in [-1, 101, 1000] {
            assert!(matches!(coord.submit(A, raw), Err(CoordinatorError::InvalidGuess(_))));
        }
        assert!(!coord.round(1).unwrap().player(&A).unwrap().has_submitted());
        assert!(coord.submit(A, 100).is_ok());
    }

    #[test]
    fn test_rejection_events_capped() {
        let mut coord = scenario();
        coord.start_round(1).unwrap();
        coord.take_events();

        for _ in 0..50 {
            assert!(coord.submit(A, 500).is_err());
        }
        coord.submit(B, -3).unwrap_err();

        let rejected: Vec<_> = coord.take_events()
            .into_iter()
            .filter(|e| matches!(e.kind, RoundEventKind::SubmissionRejected { .. }))
            .collect();
        let for_a = rejected.iter().filter(|e| e.player_id == Some(A)).count();
        assert_eq!(for_a, MAX_REJECTION_EVENTS as usize);
        assert_eq!(rejected.len(), MAX_REJECTION_EVENTS as usize + 1);

        // The cap is per round.
        coord.submit(A, 10).unwrap();
        coord.submit(B, 10).unwrap();
        coord.submit(C, 10).unwrap();
        coord.start_round(2).unwrap();
        coord.take_events();
        coord.submit(A, 500).unwrap_err();
        assert_eq!(coord.take_events().len(), 1);
    }

    #[test]
    fn test_invalid_guess_message() {
        let mut coord = scenario();
        coord.start_round(1).unwrap();
        let err = coord.submit(A, 150).unwrap_err();
        assert!(err.to_string().starts_with("Your guess must be between 0 and 100"));
    }

    #[test]
    fn test_duplicate_submission_rejected() {
        let mut coord = scenario();
        coord.start_round(1).unwrap();
        coord.submit(A, 40).unwrap();

        assert_eq!(
            coord.submit(A, 41).unwrap_err(),
            CoordinatorError::AlreadySubmitted { player: A, round: 1 }
        );
        assert_eq!(coord.round(1).unwrap().player(&A).unwrap().guess().map(Guess::value), Some(40));
    }

    #[test]
    fn test_late_submission_after_timeout() {
        let mut coord = scenario();
        coord.start_round(1).unwrap();
        coord.submit(A, 40).unwrap();
        coord.timeout(1).unwrap().unwrap();

        assert_eq!(coord.submit(B, 50).unwrap_err(), CoordinatorError::LateSubmission(1));
        let b = coord.round(1).unwrap().player(&B).unwrap();
        assert!(b.is_fallback());
        assert_eq!(b.score, Some(100));
    }

    #[test]
    fn test_completion_fires_once() {
        let mut coord = scenario();
        coord.start_round(1).unwrap();
        coord.submit(A, 1).unwrap();
        coord.submit(B, 2).unwrap();
        assert!(coord.submit(C, 3).unwrap().completion.is_some());

        // Timer firing after the last submission.
        assert!(coord.timeout(1).unwrap().is_none());
        assert!(coord.try_complete(0).is_none());

        let completions = coord.take_events().iter()
            .filter(|e| matches!(e.kind, RoundEventKind::RoundCompleted { .. }))
            .count();
        assert_eq!(completions, 1);
    }

    #[test]
    fn test_round_ordering() {
        let mut coord = scenario();
        assert_eq!(coord.submit(A, 1).unwrap_err(), CoordinatorError::RoundNotStarted);
        assert_eq!(
            coord.start_round(2).unwrap_err(),
            CoordinatorError::RoundOutOfOrder { round: 2, current: 0 }
        );
        assert_eq!(
            coord.start_round(3).unwrap_err(),
            CoordinatorError::RoundOutOfRange { round: 3, num_rounds: 2 }
        );

        coord.start_round(1).unwrap();
        // Round 1 still open.
        assert_eq!(
            coord.start_round(2).unwrap_err(),
            CoordinatorError::RoundOutOfOrder { round: 2, current: 1 }
        );
        assert_eq!(coord.timeout(2).unwrap_err(), CoordinatorError::UnknownRound(2));
    }

    #[test]
    fn test_outsider_rejected() {
        let mut coord = scenario();
        coord.start_round(1).unwrap();
        let stranger = PlayerId::new([9; 16]);
        assert!(matches!(
            coord.submit(stranger, 5),
            Err(CoordinatorError::PlayerNotInGroup { group: 1, .. })
        ));
    }

    #[test]
    fn test_nobody_submits() {
        let mut coord = coordinator(1, FixedTargets::new(20));
        coord.start_round(1).unwrap();
        let done = coord.timeout(1).unwrap().unwrap();

        assert!(done.results.players.iter().all(|p| p.is_fallback && p.score == 100));
        let ranks: Vec<u32> = done.results.players.iter().map(|p| p.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
        assert!(done.final_standings.is_some());
    }

    #[test]
    fn test_missing_target_is_backfilled() {
        let mut coord = coordinator(1, FixedTargets::new(30));
        coord.start_round(1).unwrap();
        coord.rounds[0].target = None;

        let out = coord.submit(A, 35).unwrap();
        assert_eq!(out.ack.score, 5);
        assert!(coord.round(1).unwrap().target_backfilled);
        let anomalies: Vec<_> = coord.take_events().into_iter().filter(|e| e.is_anomaly()).collect();
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].kind, RoundEventKind::TargetBackfilled { target: 30 });
    }

    #[test]
    fn test_defensive_recompute_repairs_and_is_idempotent() {
        let mut coord = scenario();
        coord.start_round(1).unwrap();
        coord.submit(A, 40).unwrap();
        coord.submit(B, 50).unwrap();
        coord.timeout(1).unwrap();
        coord.start_round(2).unwrap();
        coord.submit(A, 15).unwrap();
        coord.submit(B, 0).unwrap();
        coord.submit(C, 90).unwrap();
        let clean: Vec<GroupRound> = coord.rounds().to_vec();

        assert!(!coord.defensive_recompute(1).unwrap());

        // Corrupt a round-1 score and some derived round-2 fields.
        coord.rounds[0].players[0].score = Some(99);
        coord.rounds[0].players[2].submission = Submission::NotSubmitted;
        coord.rounds[1].players[1].rank = Some(1);
        coord.rounds[1].players[2].final_rank = None;

        assert!(coord.defensive_recompute(1).unwrap());
        assert_eq!(coord.rounds(), clean.as_slice());

        assert!(!coord.defensive_recompute(1).unwrap());
        assert_eq!(coord.rounds(), clean.as_slice());
    }

    #[test]
    fn test_results_of_open_round() {
        let mut coord = scenario();
        coord.start_round(1).unwrap();
        coord.submit(A, 40).unwrap();

        assert_eq!(coord.results(1).unwrap(), None);
        assert!(coord.final_standings().is_none());
        assert_eq!(coord.results(2).unwrap_err(), CoordinatorError::UnknownRound(2));
    }
}
